// Property-based tests for the editing core: delete/undo, cut, and the text codec.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;

use cellgrid_core::Range;
use cellgrid_engine::{CapacityPolicy, Clipboard, History, SparseGrid};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const ROWS: usize = 6;
const COLS: usize = 5;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Cell text: mostly plain, sometimes with delimiters, quotes or line breaks.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z0-9]{1,6}",
        1 => "[a-z ,;\"|\t]{1,8}",
        1 => Just("two\nlines".to_string()),
        1 => Just("\"\"".to_string()),
    ]
}

/// A populated ROWS x COLS grid, 0..=12 cells set.
fn arb_grid() -> impl Strategy<Value = SparseGrid> {
    prop::collection::vec(((0..ROWS), (0..COLS), arb_text()), 0..=12).prop_map(|cells| {
        let mut grid = SparseGrid::new(ROWS, COLS);
        for (row, col, text) in cells {
            grid.set(row, col, &text).unwrap();
        }
        grid
    })
}

fn arb_range() -> impl Strategy<Value = Range> {
    ((0..ROWS), (0..COLS), (0..ROWS), (0..COLS)).prop_map(|(r1, c1, r2, c2)| Range::new(r1, c1, r2, c2))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Delete clears exactly the populated cells in the range; undo restores the grid.
    #[test]
    fn delete_then_undo_is_identity(grid in arb_grid(), range in arb_range()) {
        let original = grid.clone();
        let mut grid = grid;
        let mut history = History::new();

        let expected = original.cells_in_range(&range).len();
        let cleared = history.delete(&mut grid, &range);
        prop_assert_eq!(cleared, expected);

        for ((row, col), text) in original.cells_iter() {
            if range.contains(row, col) {
                prop_assert_eq!(grid.get(row, col), "");
            } else {
                prop_assert_eq!(grid.get(row, col), text);
            }
        }

        history.undo(&mut grid).unwrap();
        prop_assert_eq!(&grid, &original);
        prop_assert!(history.undo(&mut grid).unwrap().is_none());
    }

    /// Cut leaves the grid as delete would and the clipboard as copy would.
    #[test]
    fn cut_is_copy_plus_delete(grid in arb_grid(), range in arb_range()) {
        let mut copied = Clipboard::new();
        copied.copy_from(&grid, &range);

        let mut deleted = grid.clone();
        History::new().delete(&mut deleted, &range);

        let mut cut_grid = grid;
        let mut clip = Clipboard::new();
        let mut history = History::new();
        clip.cut_from(&mut cut_grid, &range, &mut history);

        prop_assert_eq!(&clip, &copied);
        prop_assert_eq!(&cut_grid, &deleted);
    }

    /// Copy then paste at the source origin leaves the grid unchanged.
    #[test]
    fn paste_over_source_is_noop(grid in arb_grid(), range in arb_range()) {
        let mut clip = Clipboard::new();
        clip.copy_from(&grid, &range);

        let mut pasted = grid.clone();
        let written = clip.paste_to(&mut pasted, range.top_row, range.left_col).unwrap();
        prop_assert_eq!(written.len(), range.cell_count());
        prop_assert_eq!(&pasted, &grid);
    }

    /// Decode(encode(g)) reproduces every cell and the declared extent.
    #[test]
    fn codec_round_trip(grid in arb_grid(), delim in prop::sample::select(vec![b',', b'\t', b';', b'|'])) {
        let text = cellgrid_io::encode(&grid, delim).unwrap();
        let decoded = cellgrid_io::decode(&text, delim, CapacityPolicy::Strict).unwrap();
        prop_assert_eq!(&decoded, &grid);
    }

    /// Writing "" and clearing are the same operation.
    #[test]
    fn set_empty_clears(grid in arb_grid(), row in 0..ROWS, col in 0..COLS) {
        let mut via_set = grid.clone();
        via_set.set(row, col, "").unwrap();

        let mut via_clear = grid;
        via_clear.clear(row, col);

        prop_assert!(!via_set.is_populated(row, col));
        prop_assert_eq!(&via_set, &via_clear);
    }
}
