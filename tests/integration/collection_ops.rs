//! End-to-end checks on the page collection: selection remapping under
//! removal, block moves under every boundary condition.

use rstest::rstest;

use crate::common::pdf_collection;

fn order(collection: &pagedeck::PageCollection) -> Vec<u32> {
    collection
        .pages()
        .iter()
        .map(|p| p.source_page_number)
        .collect()
}

#[rstest]
// Drop B and D onto E: they land before E, selection follows them.
#[case(vec![1, 3], 4, vec![1, 3, 2, 4, 5], vec![2, 3])]
// Drop a contiguous pair at the front.
#[case(vec![2, 3], 0, vec![3, 4, 1, 2, 5], vec![0, 1])]
// Drop the first page onto the middle.
#[case(vec![0], 3, vec![2, 3, 1, 4, 5], vec![2])]
// Append a scattered block past the end.
#[case(vec![0, 4], 5, vec![2, 3, 4, 1, 5], vec![3, 4])]
fn move_block_cases(
    #[case] block: Vec<usize>,
    #[case] target: usize,
    #[case] expected_order: Vec<u32>,
    #[case] expected_selection: Vec<usize>,
) {
    let (_store, mut collection) = pdf_collection("doc.pdf", 5, 595.0, 842.0);

    assert!(collection.move_block(&block, target));
    assert_eq!(order(&collection), expected_order);
    assert_eq!(collection.selected_indices(), expected_selection);
}

#[test]
fn move_block_inside_block_is_identity() {
    for target in 1..=3 {
        let (_store, mut collection) = pdf_collection("doc.pdf", 6, 595.0, 842.0);
        let before = order(&collection);

        assert!(!collection.move_block(&[1, 2, 3], target));
        assert_eq!(order(&collection), before);
    }
}

#[test]
fn move_block_exhaustive_invariants() {
    // For every block of up to three pages and every target on a six page
    // deck: moved pages stay contiguous and in order, untouched pages keep
    // their order, and the selection equals the landing run.
    let n = 6usize;
    for mask in 1u32..(1 << n) {
        if mask.count_ones() > 3 {
            continue;
        }
        let block: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();

        for target in 0..=n {
            let (_store, mut collection) = pdf_collection("doc.pdf", n, 595.0, 842.0);
            let moved_pages: Vec<u32> = block.iter().map(|&i| (i + 1) as u32).collect();

            if !collection.move_block(&block, target) {
                assert!(block.contains(&target), "no-op only when dropping on the block");
                continue;
            }

            let new_order = order(&collection);

            // The moved pages form one contiguous run in original order.
            let run_start = new_order
                .iter()
                .position(|p| *p == moved_pages[0])
                .expect("moved page present");
            assert_eq!(
                &new_order[run_start..run_start + moved_pages.len()],
                moved_pages.as_slice(),
                "block {block:?} target {target}"
            );

            // The landing position follows the index-remap rule.
            let before = block.iter().filter(|&&i| i < target).count();
            let expected = (target - before).min(n - block.len());
            assert_eq!(run_start, expected, "block {block:?} target {target}");

            // Untouched pages keep their relative order.
            let untouched: Vec<u32> = new_order
                .iter()
                .copied()
                .filter(|p| !moved_pages.contains(p))
                .collect();
            assert!(untouched.windows(2).all(|w| w[0] < w[1]));

            // Selection is exactly the landing run.
            assert_eq!(
                collection.selected_indices(),
                (expected..expected + block.len()).collect::<Vec<_>>()
            );
        }
    }
}

#[test]
fn remove_pages_selection_follows_pages() {
    let (_store, mut collection) = pdf_collection("doc.pdf", 8, 595.0, 842.0);
    for i in [1, 4, 6] {
        collection.select_page(i);
    }

    collection.remove_pages(&[0, 4, 7]);

    // Page 1 slides to 0, page 4 was removed, page 6 slides to 4.
    assert_eq!(collection.selected_indices(), vec![0, 4]);
    assert_eq!(order(&collection), vec![2, 3, 4, 6, 7]);
}

#[test]
fn delete_then_move_keeps_selection_coherent() {
    let (_store, mut collection) = pdf_collection("doc.pdf", 6, 595.0, 842.0);

    collection.select_range(2, 4);
    collection.remove_selected();
    assert_eq!(order(&collection), vec![1, 2, 6]);
    assert_eq!(collection.selected_count(), 0);

    collection.move_block(&[2], 0);
    assert_eq!(order(&collection), vec![6, 1, 2]);
    assert_eq!(collection.selected_indices(), vec![0]);

    // Every selected index still points at a real page.
    for index in collection.selected_indices() {
        assert!(collection.page(index).is_some());
    }
}

#[test]
fn toggle_select_all_round_trip() {
    let (_store, mut collection) = pdf_collection("doc.pdf", 4, 595.0, 842.0);

    collection.toggle_select_all();
    assert_eq!(collection.selected_count(), 4);

    collection.toggle_selection(2);
    assert_eq!(collection.selected_count(), 3);

    collection.toggle_select_all();
    assert_eq!(collection.selected_count(), 4);

    collection.toggle_select_all();
    assert_eq!(collection.selected_count(), 0);
}
