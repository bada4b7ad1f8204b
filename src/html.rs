use scraper::{ElementRef, Html, Node};

const INDENT: &str = " ";

// Indentation stops growing past this depth so output stays linear in size.
const MAX_INDENT_DEPTH: usize = 256;

// Elements that never carry children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

// Elements whose text is emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

/// Pending output while walking the tree.
enum Step<'a> {
    Open(ElementRef<'a>, usize),
    Close(&'a str, usize),
    Line(String, usize),
}

/// Re-indent an HTML document or fragment, one node per line.
///
/// Input that mentions `<html` is parsed as a full document; anything else is
/// parsed as a fragment and printed without the synthetic wrapper element.
/// The tree is walked with an explicit stack, so nesting depth is bounded
/// only by memory.
pub fn prettify(content: &[u8]) -> String {
    let source = String::from_utf8_lossy(content);
    let mut out = String::with_capacity(source.len() * 2);

    if source.to_ascii_lowercase().contains("<html") {
        let document = Html::parse_document(&source);
        let roots = document
            .tree
            .root()
            .children()
            .filter_map(|child| step_for(child.value(), ElementRef::wrap(child), 0))
            .collect();
        write_steps(roots, &mut out);
    } else {
        let fragment = Html::parse_fragment(&source);
        let roots = fragment
            .root_element()
            .children()
            .filter_map(|child| step_for(child.value(), ElementRef::wrap(child), 0))
            .collect();
        write_steps(roots, &mut out);
    }

    out
}

/// The step a child node turns into, if it prints anything at all.
fn step_for<'a>(
    node: &Node,
    element: Option<ElementRef<'a>>,
    depth: usize,
) -> Option<Step<'a>> {
    match node {
        Node::Doctype(doctype) => {
            Some(Step::Line(format!("<!DOCTYPE {}>", doctype.name()), depth))
        }
        Node::Comment(comment) => Some(Step::Line(format!("<!--{}-->", &**comment), depth)),
        Node::Text(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| Step::Line(escape_text(text), depth))
        }
        Node::Element(_) => element.map(|element| Step::Open(element, depth)),
        _ => None,
    }
}

fn write_steps(roots: Vec<Step<'_>>, out: &mut String) {
    let mut stack: Vec<Step<'_>> = roots.into_iter().rev().collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Line(line, depth) => push_line(out, depth, &line),
            Step::Close(name, depth) => push_line(out, depth, &format!("</{name}>")),
            Step::Open(element, depth) => {
                let value = element.value();
                let name = value.name();

                let mut open = format!("<{name}");
                for (attr, attr_value) in value.attrs() {
                    open.push_str(&format!(" {attr}=\"{}\"", escape_attr(attr_value)));
                }
                open.push('>');
                push_line(out, depth, &open);

                if VOID_ELEMENTS.contains(&name) {
                    continue;
                }

                stack.push(Step::Close(name, depth));
                if RAW_TEXT_ELEMENTS.contains(&name) {
                    let raw: String = element.text().collect();
                    if !raw.trim().is_empty() {
                        stack.push(Step::Line(raw.trim().to_string(), depth + 1));
                    }
                } else {
                    let children: Vec<Step<'_>> = element
                        .children()
                        .filter_map(|child| {
                            step_for(child.value(), ElementRef::wrap(child), depth + 1)
                        })
                        .collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }
    }
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    out.push_str(&INDENT.repeat(depth.min(MAX_INDENT_DEPTH)));
    out.push_str(line);
    out.push('\n');
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
