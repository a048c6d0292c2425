//! Simple inspector for save files: piles, members and what a clean would remove.

use std::fs;

use items_purge::{compute_closure, parse, CleanOptions, Document, Grammar, ItemIndex};

fn preview(doc: &Document, index: &ItemIndex, id: &str) -> String {
    let Some(item) = index.get(id) else {
        return id.to_string();
    };
    let block = doc.block(item.block);
    let text = doc.text(block.span);
    let first_line = text.lines().next().unwrap_or("").trim();
    let preview: String = first_line.chars().take(60).collect();
    if first_line.chars().count() > 60 {
        format!("{}...", preview)
    } else {
        preview
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "items.txt".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let doc = parse(&data, &Grammar::default()).expect("Failed to parse");
    let index = ItemIndex::build(&doc).expect("Inconsistent items");

    println!("\n=== Items ({}) ===", index.len());
    println!("Top-level records: {}", doc.roots().len());
    println!("Blocks: {}", doc.blocks().len());

    let mut piles: Vec<_> = index.piles().collect();
    piles.sort();

    println!("\n=== Piles ({}) ===", piles.len());
    for pile in &piles {
        let mut members: Vec<_> = index.members(pile.as_str()).collect();
        members.sort();
        let owner = if index.contains(pile.as_str()) { "item" } else { "root" };
        println!("{} [{}]: {} items", pile, owner, members.len());
        for id in members.iter().take(10) {
            println!("  - {}", id);
        }
        if members.len() > 10 {
            println!("  ... and {} more", members.len() - 10);
        }
    }

    let options = CleanOptions::default();
    let closure = compute_closure(&index, &options.deleted_piles);

    println!("\n=== Would remove ({}) ===", closure.len());
    let mut ids: Vec<_> = closure.ids.iter().collect();
    ids.sort();
    for id in ids {
        println!("  {}", preview(&doc, &index, id.as_str()));
    }

    if !closure.cycles.is_empty() {
        println!("\n=== Ownership cycles ({}) ===", closure.cycles.len());
        for cycle in &closure.cycles {
            let ids: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
            println!("  {}", ids.join(" -> "));
        }
    }
}
