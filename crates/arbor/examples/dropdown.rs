//! Render a dropdown, open its option list and a submenu, and print each
//! frame to stdout.

use arbor::{
    Window, WindowConfig,
    control::Container,
    dump::dump,
    error::Result,
    geom::Edges,
    ingest::LogSource,
    layout::Layout,
    widgets::{Dropdown, LogView, Menu, Panel},
};
use clap::Parser;
use tracing::info;

/// Items shown in the dropdown.
const ITEMS: [&str; 6] = ["Red", "Orange", "Yellow", "Green", "Blue", "Violet"];

/// CLI flags for the dropdown demo.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Screen width (columns).
    #[clap(long, default_value_t = 48)]
    width: u32,

    /// Screen height (rows).
    #[clap(long, default_value_t = 16)]
    height: u32,

    /// Row the dropdown sits on.
    #[clap(long, default_value_t = 10)]
    row: i32,

    /// Print the node tree after each frame.
    #[clap(short, long)]
    tree: bool,
}

/// Print a frame with a border so trailing blanks stay visible.
fn show(title: &str, w: &mut Window, tree: bool) -> Result<()> {
    let frame = w.paint()?;
    let width = frame.size().w as usize;
    println!("{title}");
    println!("+{}+", "-".repeat(width));
    for line in frame.lines() {
        println!("|{line}|");
    }
    println!("+{}+", "-".repeat(width));
    if tree {
        print!("{}", dump(w.tree(), w.root())?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let logs = LogSource::new();
    logs.install()?;

    let config = WindowConfig::default().with_insets(Edges::all(1));
    let mut w = Window::with_config((args.width, args.height), config);
    let body = w.add(Panel::row())?;
    let left = w
        .tree_mut()
        .add_child(body, Panel::column().with_layout(|l| l.flex(1)))?;
    w.tree_mut()
        .add_child(left, Container::new(Layout::column().height(args.row)))?;
    let dropdown = w
        .tree_mut()
        .add_child_typed(left, Dropdown::new(ITEMS.to_vec()))?;
    w.tree_mut()
        .add_child(body, LogView::from_source(&logs).with_layout(Layout::default().flex(1)))?;

    show("closed", &mut w, args.tree)?;

    let Some(portal) = Dropdown::toggle(&mut w, dropdown)? else {
        return Ok(());
    };
    info!("opened {:?}", w.portals().get(portal)?.placement);
    show("open", &mut w, args.tree)?;

    let menu = w.portals().get(portal)?.content;
    Menu::open_submenu(&mut w, menu, 2, Menu::new(["Light", "Dark"]))?;
    info!("submenu open");
    show("submenu", &mut w, args.tree)?;

    Dropdown::confirm(&mut w, dropdown, 4)?;
    info!("selected {}", dropdown.get(w.tree())?.selected_index());
    show("confirmed", &mut w, args.tree)?;
    Ok(())
}
