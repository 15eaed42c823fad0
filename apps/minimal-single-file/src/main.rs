//! Headless demo that drives `virtua-core` end to end with no rendering
//! toolkit attached: a [`TextCell`] just owns a `String`, and `main` prints
//! the materialized viewport after a handful of scroll and mutation events.
//!
//! Run with `--features logging` to see the manager's debug trail on stderr.

use virtua_core::{
    BufferSize, Cell, Configuration, ItemsMutation, LinearManager, VirtError,
};

/// The simplest possible [`Cell`] implementation: no scene graph, no
/// layout, just the text it would display.
struct TextCell {
    index: isize,
    text: String,
}

impl Cell<String> for TextCell {
    type Node = String;

    fn update_index(&mut self, index: isize) {
        self.index = index;
    }

    fn update_item(&mut self, item: &String) {
        self.text = item.clone();
    }

    fn on_cache(&mut self) {
        log::debug!("cell[{}] parked in cache", self.index);
    }

    fn on_de_cache(&mut self) {
        log::debug!("cell[{}] pulled back out of cache", self.index);
    }

    fn dispose(self) {
        log::debug!("cell[{}] disposed", self.index);
    }

    fn force_refresh(&mut self) {
        log::debug!("cell[{}] force-refreshed", self.index);
    }

    fn as_node(&self) -> &String {
        &self.text
    }
}

fn build_cell(item: &String) -> Result<TextCell, std::convert::Infallible> {
    Ok(TextCell {
        index: 0,
        text: item.clone(),
    })
}

fn print_viewport(manager: &LinearManager<String, String, TextCell, fn(&String) -> Result<TextCell, std::convert::Infallible>>) {
    let range = manager.observe_state().range();
    if range.is_invalid() {
        println!("  (empty)");
        return;
    }
    let mut rows: Vec<_> = manager.observe_state().cells().values_by_index().collect();
    rows.sort_by_key(|(idx, _)| **idx);
    for (idx, cell) in rows {
        println!("  [{idx:>3}] {}", cell.as_node());
    }
}

fn main() -> Result<(), VirtError> {
    #[cfg(feature = "logging")]
    env_logger::init();

    let items: Vec<String> = (0..200).map(|i| format!("row-{i}")).collect();

    let mut config = Configuration::new();
    config.set_cell_size(32.0)?;
    config.set_cache_capacity(64);
    config.set_buffer_size(BufferSize::Standard);

    let factory: fn(&String) -> Result<TextCell, std::convert::Infallible> = build_cell;
    let mut manager = LinearManager::new(config, factory);

    manager.notify_items_replaced(&items)?;
    manager.notify_geometry(320.0, 32.0, 0.0, &items)?;

    println!("initial viewport (scroll = 0):");
    print_viewport(&manager);

    manager.scroll_to_pixel(800.0, &items)?;
    println!("\nafter scroll_to_pixel(800.0):");
    print_viewport(&manager);

    let removed: Vec<String> = items
        .iter()
        .enumerate()
        .filter(|(i, _)| !(5..=7).contains(i))
        .map(|(_, v)| v.clone())
        .collect();
    manager.notify_items_mutated(ItemsMutation::Removed(vec![5, 6, 7]), &removed)?;
    println!("\nafter removing indices 5..=7 near the top:");
    print_viewport(&manager);

    println!("\ncells currently pooled in cache: {}", manager.cache_len());

    Ok(())
}
