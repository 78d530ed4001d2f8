//! Tests for incremental recalculation through the workbook API

use cellgraph::prelude::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn addresses(batch: &RecalcBatch) -> Vec<String> {
    batch.addresses().iter().map(|a| a.to_string()).collect()
}

fn value(workbook: &Workbook, address: &str) -> CellValue {
    workbook.get_cell(address).unwrap().value
}

/// Editing a precedent updates its dependents in the same batch
#[test]
fn test_propagation() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "5").unwrap();
    workbook.edit("B1", "=A1*2").unwrap();
    assert_eq!(value(&workbook, "B1"), CellValue::Number(10.0));

    let batch = workbook.edit("A1", "10").unwrap();
    assert_eq!(
        serde_json::to_string(&batch).unwrap(),
        r#"{"A1":{"value":10.0,"display":"10"},"B1":{"value":20.0,"display":"20"}}"#
    );

    let b1 = workbook.get_cell("B1").unwrap();
    assert_eq!(b1.value, CellValue::Number(20.0));
    assert_eq!(b1.display, "20");
    assert_eq!(b1.formula.as_deref(), Some("=A1*2"));
}

/// Re-entering the same value commits nothing
#[test]
fn test_diff_only_commits() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "5").unwrap();
    workbook.edit("B1", "=A1*2").unwrap();

    let batch = workbook.edit("A1", "5").unwrap();
    assert!(batch.is_empty());
    // Dependents are not recomputed either
    assert_eq!(workbook.last_stats().cells_evaluated, 0);
    let batch = workbook.edit("A1", "5").unwrap();
    assert!(batch.is_empty());
    assert_eq!(workbook.last_stats().cells_evaluated, 0);

    // Different text, same value
    let batch = workbook.edit("A1", "5.0").unwrap();
    assert!(batch.is_empty());
    assert_eq!(workbook.last_stats().cells_evaluated, 0);
    assert_eq!(workbook.get_cell("A1").unwrap().raw_input, "5.0");

    // A formula replaced by its own value still recomputes dependents
    workbook.edit("A1", "=2+3").unwrap();
    let batch = workbook.edit("A1", "5").unwrap();
    assert!(batch.is_empty());
    assert_eq!(workbook.last_stats().cells_evaluated, 1);
}

/// A chain is evaluated precedents first
#[test]
fn test_multi_hop_order() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "1").unwrap();
    workbook.edit("C1", "=B1+1").unwrap();
    workbook.edit("B1", "=A1+1").unwrap();
    assert_eq!(value(&workbook, "C1"), CellValue::Number(3.0));

    let batch = workbook.edit("A1", "10").unwrap();
    assert_eq!(addresses(&batch), ["A1", "B1", "C1"]);
    assert_eq!(batch.get("B1").unwrap().value, CellValue::Number(11.0));
    assert_eq!(batch.get("C1").unwrap().value, CellValue::Number(12.0));
}

/// A diamond is evaluated once per cell with settled inputs
#[test]
fn test_diamond() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "2").unwrap();
    workbook.edit("B1", "=A1*10").unwrap();
    workbook.edit("B2", "=A1+B1").unwrap();
    workbook.edit("C1", "=B1+B2").unwrap();

    workbook.edit("A1", "3").unwrap();
    assert_eq!(value(&workbook, "B1"), CellValue::Number(30.0));
    assert_eq!(value(&workbook, "B2"), CellValue::Number(33.0));
    assert_eq!(value(&workbook, "C1"), CellValue::Number(63.0));
    assert_eq!(workbook.last_stats().cells_evaluated, 3);
}

/// Circular references are marked instead of looping, and recover once broken
#[test]
fn test_cycle_detection_and_recovery() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "=B1").unwrap();
    workbook.edit("C1", "=A1+1").unwrap();

    let batch = workbook.edit("B1", "=A1").unwrap();
    for address in ["A1", "B1", "C1"] {
        let update = batch.get(address).unwrap();
        assert_eq!(update.value, CellValue::Error(CellError::Cycle));
        assert_eq!(update.display, "#CYCLE!");
    }
    assert_eq!(workbook.last_stats().cycles, 3);

    let batch = workbook.edit("B1", "5").unwrap();
    assert_eq!(addresses(&batch), ["B1", "A1", "C1"]);
    assert_eq!(value(&workbook, "A1"), CellValue::Number(5.0));
    assert_eq!(value(&workbook, "C1"), CellValue::Number(6.0));
}

/// Errors stay in their cells and propagate through references
#[test]
fn test_error_isolation() {
    let mut workbook = Workbook::new();
    workbook.edit("C1", "7").unwrap();
    let batch = workbook.edit("A1", "=1/0").unwrap();
    assert_eq!(batch.get("A1").unwrap().display, "#DIV/0!");

    let batch = workbook.edit("B1", "=A1+1").unwrap();
    assert_eq!(
        batch.get("B1").unwrap().value,
        CellValue::Error(CellError::Div0)
    );
    assert_eq!(value(&workbook, "C1"), CellValue::Number(7.0));

    // Caught errors do not propagate
    workbook.edit("D1", "=IFERROR(B1, -1)").unwrap();
    assert_eq!(value(&workbook, "D1"), CellValue::Number(-1.0));
}

/// A formula that does not parse shows #ERROR! and reads nothing
#[test]
fn test_syntax_error() {
    let mut workbook = Workbook::new();
    let batch = workbook.edit("A1", "=SUM(A2").unwrap();
    assert_eq!(batch.get("A1").unwrap().display, "#ERROR!");

    let a1 = CellAddress::parse("A1").unwrap();
    assert_eq!(workbook.graph().precedents(a1).count(), 0);

    let batch = workbook.edit("A2", "3").unwrap();
    assert_eq!(addresses(&batch), ["A2"]);

    // Fixing the formula picks the reference up
    workbook.edit("A1", "=SUM(A2)").unwrap();
    assert_eq!(value(&workbook, "A1"), CellValue::Number(3.0));
}

/// Formulas too deep to evaluate are errors, not crashes
#[test]
fn test_deeply_nested_formula() {
    let mut workbook = Workbook::new();
    workbook.edit("A2", "=A1+1").unwrap();

    let nested = format!("={}1{}", "(".repeat(10_000), ")".repeat(10_000));
    let batch = workbook.edit("A1", &nested).unwrap();
    assert_eq!(batch.get("A1").unwrap().display, "#ERROR!");
    assert_eq!(value(&workbook, "A2"), CellValue::Error(CellError::Error));

    let chain = format!("=1{}", "+1".repeat(200_000));
    workbook.edit("A1", &chain).unwrap();
    assert_eq!(workbook.get_cell("A1").unwrap().display, "#ERROR!");

    workbook.edit("A1", "=((1))").unwrap();
    assert_eq!(value(&workbook, "A2"), CellValue::Number(2.0));
}

/// Ranges track every cell they cover
#[test]
fn test_range_dependencies() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "1").unwrap();
    workbook.edit("A2", "2").unwrap();
    workbook.edit("A3", "text").unwrap();
    workbook.edit("B1", "=SUM(A1:A3)").unwrap();
    workbook.edit("B2", "=AVERAGE(A1:A3)").unwrap();
    assert_eq!(value(&workbook, "B1"), CellValue::Number(3.0));
    assert_eq!(value(&workbook, "B2"), CellValue::Number(1.5));

    let batch = workbook.edit("A3", "6").unwrap();
    assert_eq!(addresses(&batch), ["A3", "B1", "B2"]);
    assert_eq!(value(&workbook, "B1"), CellValue::Number(9.0));
}

/// Ranges over the configured limit evaluate to #REF!
#[test]
fn test_oversized_range() {
    let options = WorkbookOptions::default().with_max_range_cells(4);
    let mut workbook = Workbook::with_options(options);

    workbook.edit("B1", "=SUM(A1:A10)").unwrap();
    assert_eq!(value(&workbook, "B1"), CellValue::Error(CellError::Ref));
    assert_eq!(workbook.graph().edge_count(), 0);

    workbook.edit("B2", "=SUM(A1:A4)").unwrap();
    assert_eq!(workbook.graph().edge_count(), 4);
}

/// Comparisons and logical functions produce booleans
#[test]
fn test_boolean_results() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "4").unwrap();
    workbook.edit("B1", "=A1>3").unwrap();
    workbook.edit("C1", "=IF(B1, \"big\", \"small\")").unwrap();

    let b1 = workbook.get_cell("B1").unwrap();
    assert_eq!(b1.value, CellValue::Boolean(true));
    assert_eq!(b1.display, "TRUE");
    assert_eq!(workbook.get_cell("C1").unwrap().display, "big");

    workbook.edit("A1", "1").unwrap();
    assert_eq!(workbook.get_cell("C1").unwrap().display, "small");
}

/// Subscribers see each non-empty batch exactly once
#[test]
fn test_batch_sinks() {
    let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::default();
    let mut workbook = Workbook::new();

    let sink = Rc::clone(&seen);
    workbook.subscribe(move |batch: &RecalcBatch| {
        sink.borrow_mut().push(addresses(batch));
    });

    workbook.edit("A1", "1").unwrap();
    workbook.edit("B1", "=A1").unwrap();
    workbook.edit("A1", "1").unwrap();
    workbook.edit("A1", "2").unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            vec!["A1".to_string()],
            vec!["B1".to_string()],
            vec!["A1".to_string(), "B1".to_string()],
        ]
    );
}

/// Invalid addresses are the only edit errors
#[test]
fn test_invalid_address() {
    let mut workbook = Workbook::new();
    assert!(matches!(workbook.edit("1A", "5"), Err(Error::InvalidAddress(_))));
    assert!(matches!(workbook.edit("A0", "5"), Err(Error::InvalidAddress(_))));
    assert!(workbook.get_cell("").is_err());
}

/// Clearing empties every cell and forgets the graph
#[test]
fn test_clear() {
    let mut workbook = Workbook::new();
    workbook.edit("A1", "5").unwrap();
    workbook.edit("B1", "=A1*2").unwrap();

    let batch = workbook.clear();
    assert_eq!(addresses(&batch), ["A1", "B1"]);
    assert!(batch.iter().all(|(_, update)| update.value == CellValue::Empty));
    assert_eq!(workbook.get_cell("B1").unwrap(), CellView::default());
    assert!(workbook.graph().is_empty());

    let batch = workbook.edit("A1", "1").unwrap();
    assert_eq!(addresses(&batch), ["A1"]);
}

/// Seeding from rows recalculates regardless of formula placement
#[test]
fn test_from_grid() {
    let rows = vec![
        vec!["=B1*10", "=C1+1", "4"],
        vec!["=SUM(A1:C1)", "=(A1", ""],
    ];
    let workbook = Workbook::from_grid(&rows, WorkbookOptions::default());

    assert_eq!(value(&workbook, "C1"), CellValue::Number(4.0));
    assert_eq!(value(&workbook, "B1"), CellValue::Number(5.0));
    assert_eq!(value(&workbook, "A1"), CellValue::Number(50.0));
    assert_eq!(value(&workbook, "A2"), CellValue::Number(59.0));
    assert_eq!(workbook.get_cell("B2").unwrap().display, "#ERROR!");
    assert_eq!(workbook.last_stats().cells_evaluated, 4);
}
