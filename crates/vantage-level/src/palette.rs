use serde::Deserialize;
use std::error::Error;
use std::path::Path;

use crate::Block;

/// Per-block flags the visibility pipeline cares about. Anything else a
/// block might mean to gameplay is out of scope.
#[derive(Clone, Debug, Deserialize)]
pub struct BlockType {
    pub name: String,
    #[serde(default)]
    pub solid: bool,
    #[serde(default)]
    pub opaque: bool,
    #[serde(default)]
    pub translucent: bool,
    #[serde(default)]
    pub block_entity: bool,
}

#[derive(Deserialize)]
struct PaletteFile {
    blocks: Vec<BlockType>,
}

/// Immutable block palette; id 0 is always air.
#[derive(Clone, Debug)]
pub struct BlockPalette {
    types: Vec<BlockType>,
}

impl BlockPalette {
    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)?;
        let file: PaletteFile = toml::from_str(&text)?;
        if file.blocks.is_empty() {
            return Err(format!("palette {} defines no blocks", path.display()).into());
        }
        if file.blocks[0].name != "air" {
            return Err("palette block 0 must be \"air\"".into());
        }
        Ok(Self { types: file.blocks })
    }

    #[inline]
    pub fn get(&self, id: u16) -> Option<&BlockType> {
        self.types.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<u16> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(|i| i as u16)
    }

    #[inline]
    pub fn is_opaque(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.opaque).unwrap_or(false)
    }

    #[inline]
    pub fn is_solid(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.solid).unwrap_or(false)
    }

    #[inline]
    pub fn is_translucent(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.translucent).unwrap_or(false)
    }

    #[inline]
    pub fn is_block_entity(&self, b: Block) -> bool {
        self.get(b.id).map(|t| t.block_entity).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for BlockPalette {
    fn default() -> Self {
        let mk = |name: &str, solid: bool, opaque: bool, translucent: bool, block_entity: bool| {
            BlockType {
                name: name.to_string(),
                solid,
                opaque,
                translucent,
                block_entity,
            }
        };
        Self {
            types: vec![
                mk("air", false, false, false, false),
                mk("stone", true, true, false, false),
                mk("dirt", true, true, false, false),
                mk("grass", true, true, false, false),
                mk("sand", true, true, false, false),
                mk("water", false, false, true, false),
                mk("glass", true, false, false, false),
                mk("beacon", true, false, false, true),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_flags() {
        let p = BlockPalette::default();
        let stone = Block::new(p.id_by_name("stone").unwrap());
        let water = Block::new(p.id_by_name("water").unwrap());
        let glass = Block::new(p.id_by_name("glass").unwrap());
        assert!(p.is_opaque(stone) && p.is_solid(stone));
        assert!(p.is_translucent(water) && !p.is_opaque(water));
        assert!(p.is_solid(glass) && !p.is_opaque(glass));
        assert_eq!(p.id_by_name("air"), Some(0));
    }

    #[test]
    fn palette_roundtrip_from_toml() {
        let text = r#"
            [[blocks]]
            name = "air"

            [[blocks]]
            name = "rock"
            solid = true
            opaque = true
        "#;
        let dir = std::env::temp_dir().join("vantage-palette-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blocks.toml");
        std::fs::write(&path, text).unwrap();
        let p = BlockPalette::load_from_path(&path).unwrap();
        assert_eq!(p.len(), 2);
        assert!(p.is_opaque(Block::new(1)));
    }
}
