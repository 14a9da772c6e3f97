/// Paint command set executed by the rasterizer
use crate::rendering::layout::{ElementType, LayoutNode};
use crate::resources::ImagePixels;
use std::collections::HashMap;

const TEXT_RGBA: (u8, u8, u8, u8) = (24, 28, 36, 255);
const MARKER_RGBA: (u8, u8, u8, u8) = (90, 98, 110, 255);
const PLACEHOLDER_RGBA: (u8, u8, u8, u8) = (204, 208, 212, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    TextRun {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        rgba: (u8, u8, u8, u8),
    },
    Blit {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: ImagePixels,
    },
}

/// Turn layout nodes into paint commands. `images` maps a node index to its
/// decoded pixels; image nodes without an entry paint as placeholder rects.
pub fn build_display_list(
    nodes: &[LayoutNode],
    images: &HashMap<usize, ImagePixels>,
) -> Vec<PaintCommand> {
    let mut commands = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        let rect = &node.lb.rect;
        match node.elem_type {
            ElementType::Image => match images.get(&idx) {
                Some(pixels) => commands.push(PaintCommand::Blit {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    pixels: pixels.clone(),
                }),
                None => commands.push(PaintCommand::SolidRect {
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    rgba: PLACEHOLDER_RGBA,
                }),
            },
            ElementType::ListItem => {
                let pad = node.lb.box_model.padding as i32;
                commands.push(PaintCommand::SolidRect {
                    x: rect.x - 10,
                    y: rect.y + pad + 2,
                    width: 4,
                    height: 4,
                    rgba: MARKER_RGBA,
                });
                commands.push(PaintCommand::TextRun {
                    x: rect.x + pad,
                    y: rect.y + pad,
                    text: node.text.clone(),
                    scale: node.scale,
                    rgba: TEXT_RGBA,
                });
            }
            ElementType::Heading | ElementType::Paragraph => {
                let pad = node.lb.box_model.padding as i32;
                commands.push(PaintCommand::TextRun {
                    x: rect.x + pad,
                    y: rect.y + pad,
                    text: node.text.clone(),
                    scale: node.scale,
                    rgba: TEXT_RGBA,
                });
            }
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_region;
    use scraper::Html;

    #[test]
    fn display_list_covers_every_node() {
        let doc = Html::parse_fragment("<h2>Day 1</h2><p>Walk</p><img src='x.png'>");
        let (nodes, _) = layout_region(&doc, 400);
        let commands = build_display_list(&nodes, &HashMap::new());
        // Two text runs plus one placeholder rect for the unresolved image
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], PaintCommand::SolidRect { .. }));
    }

    #[test]
    fn resolved_image_becomes_a_blit() {
        let doc = Html::parse_fragment("<img src='x.png' width='2' height='2'>");
        let (nodes, _) = layout_region(&doc, 400);
        let mut images = HashMap::new();
        images.insert(
            0,
            ImagePixels {
                width: 2,
                height: 2,
                data: vec![255; 16],
            },
        );
        let commands = build_display_list(&nodes, &images);
        assert!(matches!(commands[0], PaintCommand::Blit { .. }));
    }
}
