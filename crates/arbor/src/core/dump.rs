use std::io::{Result as IoResult, Write};

use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::{
    NodeId,
    error::{Error, Result},
    tree::Tree,
};

/// Render a subtree as an indented listing of names, bounds and state, with
/// ANSI colors. This is a debug function.
pub fn dump(tree: &Tree, root: NodeId) -> Result<String> {
    render(tree, root, Buffer::ansi())
}

/// As [`dump`], without color escapes.
pub fn dump_plain(tree: &Tree, root: NodeId) -> Result<String> {
    render(tree, root, Buffer::no_color())
}

/// Dump into the given buffer.
fn render(tree: &Tree, root: NodeId, mut buffer: Buffer) -> Result<String> {
    tree.get(root)?;
    let mut stack = vec![(root, 0usize)];
    while let Some((id, level)) = stack.pop() {
        let node = tree.get(id)?;
        dump_node(&mut buffer, tree, id, level)
            .map_err(|e| Error::Internal(format!("dump: {e}")))?;
        stack.extend(node.children().iter().rev().map(|c| (*c, level + 1)));
    }
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Emit one line for a node.
fn dump_node(buffer: &mut Buffer, tree: &Tree, id: NodeId, level: usize) -> IoResult<()> {
    let Ok(node) = tree.get(id) else {
        return Ok(());
    };
    write!(buffer, "{}", "    ".repeat(level))?;
    buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(buffer, "{}", node.name())?;
    buffer.reset()?;

    let b = node.bounds();
    write!(buffer, " [{},{} {}x{}]", b.tl.x, b.tl.y, b.w, b.h)?;

    let mut flags = Vec::new();
    if !node.is_visible() {
        flags.push(("hidden", Color::Yellow));
    }
    if node.is_dirty() {
        flags.push(("dirty", Color::Red));
    }
    if node.needs_layout() {
        flags.push(("unmeasured", Color::Magenta));
    }
    if node.host().is_some() {
        flags.push(("portal", Color::Blue));
    }
    for (label, color) in flags {
        write!(buffer, " ")?;
        buffer.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(buffer, "{label}")?;
        buffer.reset()?;
    }
    writeln!(buffer)
}
