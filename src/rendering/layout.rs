/// Block layout for capture regions
///
/// Intentionally simple: the region subtree is flattened into a vertical
/// stack of heading, paragraph, list-item and image blocks with greedy
/// word-wrap at an estimated character width. Output height is
/// content-sized, so a capture is as tall as the region, not the viewport.
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxModel {
    pub margin: u32,
    pub border: u32,
    pub padding: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub rect: Rect,
    pub box_model: BoxModel,
}

impl LayoutBox {
    pub fn content_width(&self) -> u32 {
        let total = self.box_model.margin + self.box_model.border + self.box_model.padding;
        self.rect.width.saturating_sub(total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Heading,
    Paragraph,
    ListItem,
    Image,
}

/// A layout node couples a `LayoutBox` with its text (or image source) and
/// element type. Headings render at scale=2, body text at scale=1.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub lb: LayoutBox,
    pub text: String,
    pub elem_type: ElementType,
    pub scale: u32,
    pub src: Option<String>,
}

// Estimated glyph cell at scale=1
const CHAR_W: u32 = 8;
const CHAR_H: u32 = 8;

fn wrap_text(txt: &str, chars_per_line: usize) -> String {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in txt.split_whitespace() {
        if cur.len() + word.len() + 1 > chars_per_line && !cur.is_empty() {
            lines.push(cur);
            cur = word.to_string();
        } else {
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines.join("\n")
}

/// Compute a block layout for a region fragment at the given width.
/// Returns the layout nodes and the content-sized total height.
pub fn layout_region(doc: &Html, width: u32) -> (Vec<LayoutNode>, u32) {
    let block_sel = Selector::parse("h1, h2, h3, h4, p, li").unwrap();
    let img_sel = Selector::parse("img").unwrap();
    let block_ids: std::collections::HashSet<_> = doc.select(&block_sel).map(|el| el.id()).collect();
    let img_ids: std::collections::HashSet<_> = doc.select(&img_sel).map(|el| el.id()).collect();

    let mut y = 8u32;
    let mut nodes = Vec::new();

    for el in doc
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
    {
        if img_ids.contains(&el.id()) {
            let attr_dim = |name: &str| el.value().attr(name).and_then(|v| v.parse::<u32>().ok());
            let img_w = attr_dim("width")
                .unwrap_or(120)
                .min(width.saturating_sub(16).max(1));
            let img_h = attr_dim("height").unwrap_or(80).max(1);
            let lb = LayoutBox {
                rect: Rect {
                    x: 8,
                    y: y as i32,
                    width: img_w,
                    height: img_h,
                },
                box_model: BoxModel {
                    margin: 6,
                    border: 0,
                    padding: 0,
                },
            };
            nodes.push(LayoutNode {
                lb,
                text: String::new(),
                elem_type: ElementType::Image,
                scale: 1,
                src: el.value().attr("src").map(|s| s.to_string()),
            });
            y += img_h + 6;
            continue;
        }

        if !block_ids.contains(&el.id()) {
            continue;
        }
        // Nested text blocks (a <p> inside an <li>) already contribute to
        // the ancestor's text; lay out the outermost block only.
        let nested = el.ancestors().any(|a| block_ids.contains(&a.id()));
        if nested {
            continue;
        }

        let txt = el.text().collect::<String>();
        if txt.trim().is_empty() {
            continue;
        }

        let tag = el.value().name();
        let (elem_type, scale, padding, margin, indent) = match tag {
            "h1" | "h2" | "h3" | "h4" => (ElementType::Heading, 2u32, 8u32, 8u32, 0u32),
            "li" => (ElementType::ListItem, 1, 6, 6, 16),
            _ => (ElementType::Paragraph, 1, 6, 6, 0),
        };

        let box_w = width.saturating_sub(16 + indent);
        let content_w = box_w.saturating_sub(padding * 2);
        let char_w = CHAR_W * scale;
        let chars_per_line = if content_w >= char_w {
            (content_w / char_w) as usize
        } else {
            1
        };
        let text = wrap_text(txt.trim(), chars_per_line);
        let lines_count = (text.lines().count() as u32).max(1);
        let box_h = lines_count * CHAR_H * scale + padding * 2;

        let lb = LayoutBox {
            rect: Rect {
                x: (8 + indent) as i32,
                y: y as i32,
                width: box_w,
                height: box_h,
            },
            box_model: BoxModel {
                margin,
                border: 0,
                padding,
            },
        };
        nodes.push(LayoutNode {
            lb,
            text,
            elem_type,
            scale,
            src: None,
        });
        y += box_h + margin;
    }

    (nodes, (y + 8).max(32))
}
