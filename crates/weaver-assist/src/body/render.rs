//! Rendering of body statement trees

use super::Stmt;

const INDENT: &str = "    ";

pub(crate) fn render(root: &[Stmt]) -> String {
    let mut out = String::from("{\n");
    render_stmts(&mut out, root, 1);
    out.push('}');
    out
}

fn render_stmts(out: &mut String, stmts: &[Stmt], depth: usize) {
    for stmt in stmts {
        match stmt {
            Stmt::Line(line) => {
                indent(out, depth);
                out.push_str(line);
                out.push('\n');
            }
            Stmt::Block(block) => {
                indent(out, depth);
                out.push_str(&block.header);
                out.push_str(" {\n");
                render_stmts(out, &block.body, depth + 1);
                indent(out, depth);
                out.push_str("}\n");
            }
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
