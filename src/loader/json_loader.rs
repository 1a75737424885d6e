use std::path::{Path, PathBuf};

use macroquad::math::vec2;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::layer::{GroupLayer, LayerNode, TileLayer};
use crate::map::{TileMap, TilesetRef};
use crate::tileset::TilesetMeta;

const IN_MEMORY: &str = "<memory>";

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    encoding: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    source: String,
}

#[derive(Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
}

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    image: String,
    tilewidth: u32,
    tileheight: u32,
    columns: u32,
    tilecount: u32,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
}

fn read_json_file(path: &Path) -> Result<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(Error::UnsupportedFormat(path.display().to_string()));
    }
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<'a, T: Deserialize<'a>>(txt: &'a str, path: &Path) -> Result<T> {
    serde_json::from_str(txt).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn layer_from_json(l: JsonLayer) -> Result<LayerNode> {
    let offset = vec2(l.offsetx, l.offsety);
    let kind = match l.kind.as_deref() {
        Some(kind) => kind.to_owned(),
        None if !l.layers.is_empty() => "group".to_owned(),
        None => "tilelayer".to_owned(),
    };

    let node = match kind.as_str() {
        "group" => LayerNode::Group(GroupLayer {
            name: l.name,
            visible: l.visible,
            offset,
            layers: l
                .layers
                .into_iter()
                .map(layer_from_json)
                .collect::<Result<Vec<_>>>()?,
        }),
        "tilelayer" => {
            if let Some(encoding) = l.encoding.filter(|e| e != "csv") {
                return Err(Error::UnsupportedFormat(format!(
                    "layer '{}' uses {encoding} encoding",
                    l.name
                )));
            }
            LayerNode::Tiles(TileLayer {
                name: l.name,
                width: l.width,
                height: l.height,
                visible: l.visible,
                offset,
                data: l.data,
            })
        }
        _ => LayerNode::Unsupported { name: l.name, kind },
    };
    Ok(node)
}

fn map_from_json(j: JsonMap) -> Result<TileMap> {
    if j.tilewidth == 0 || j.tileheight == 0 || j.width == 0 || j.height == 0 {
        return Err(Error::InvalidMap(format!(
            "map dimensions must be non-zero, got {}x{} tiles of {}x{}",
            j.width, j.height, j.tilewidth, j.tileheight
        )));
    }
    let pixel_width = j.width.checked_mul(j.tilewidth);
    let pixel_height = j.height.checked_mul(j.tileheight);
    if pixel_width.is_none() || pixel_height.is_none() {
        return Err(Error::InvalidMap(format!(
            "map of {}x{} tiles of {}x{} is too large",
            j.width, j.height, j.tilewidth, j.tileheight
        )));
    }
    let layers = j
        .layers
        .into_iter()
        .map(layer_from_json)
        .collect::<Result<Vec<_>>>()?;
    let refs = j
        .tilesets
        .into_iter()
        .map(|r| TilesetRef::new(r.firstgid, r.source))
        .collect();
    Ok(TileMap::new(
        j.tilewidth,
        j.tileheight,
        j.width,
        j.height,
        refs,
        layers,
    ))
}

fn tileset_from_json(j: JsonTileset, fallback_name: &str) -> Result<TilesetMeta> {
    if j.tilewidth == 0 || j.tileheight == 0 {
        return Err(Error::InvalidMap(format!(
            "tileset '{}' has a zero tile size",
            j.name
        )));
    }
    let name = if j.name.is_empty() {
        fallback_name.to_owned()
    } else {
        j.name
    };
    Ok(TilesetMeta {
        name,
        image: j.image,
        tile_width: j.tilewidth,
        tile_height: j.tileheight,
        columns: j.columns,
        tile_count: j.tilecount,
        image_width: j.imagewidth,
        image_height: j.imageheight,
    })
}

/// Decodes a Tiled JSON map file.
pub fn decode_map_file(path: &Path) -> Result<TileMap> {
    let txt = read_json_file(path)?;
    map_from_json(parse(&txt, path)?)
}

/// Decodes a Tiled JSON map from a string.
pub fn decode_map_str(json: &str) -> Result<TileMap> {
    map_from_json(parse(json, Path::new(IN_MEMORY))?)
}

/// Decodes a Tiled JSON tileset file. An unnamed tileset takes the file stem.
pub fn decode_tileset_file(path: &Path) -> Result<TilesetMeta> {
    let txt = read_json_file(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    tileset_from_json(parse(&txt, path)?, stem)
}

/// Decodes a Tiled JSON tileset from a string.
pub fn decode_tileset_str(json: &str) -> Result<TilesetMeta> {
    tileset_from_json(parse(json, Path::new(IN_MEMORY))?, "")
}

/// File to load for a map's tileset `source`: relative to `map_dir`, with a
/// `.tsx` (or missing) extension swapped for its `.json` export.
pub fn tileset_path_for(map_dir: &Path, source: &str) -> PathBuf {
    let path = map_dir.join(source);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => path,
        _ => path.with_extension("json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_groups_keep_declaration_order() {
        let json = r#"{
          "width": 2, "height": 1, "tilewidth": 8, "tileheight": 8,
          "layers": [
            {"type":"tilelayer","name":"ground","width":2,"height":1,"data":[1,2]},
            {"type":"group","name":"deco","offsetx":4,"layers":[
              {"type":"tilelayer","name":"grass","width":2,"height":1,"data":[0,3],"visible":false},
              {"type":"objectgroup","name":"spawns","objects":[]}
            ]}
          ],
          "tilesets": [{"firstgid":1,"source":"A.tsx"}]
        }"#;
        let map = decode_map_str(json).unwrap();

        assert_eq!(map.layers.len(), 2);
        assert_eq!(map.layers[0].name(), "ground");
        match &map.layers[1] {
            LayerNode::Group(group) => {
                assert_eq!(group.offset, vec2(4.0, 0.0));
                match &group.layers[0] {
                    LayerNode::Tiles(t) => {
                        assert!(!t.visible);
                        assert_eq!(t.data, vec![0, 3]);
                    }
                    other => panic!("expected tile layer, got {other:?}"),
                }
                assert!(matches!(
                    &group.layers[1],
                    LayerNode::Unsupported { kind, .. } if kind == "objectgroup"
                ));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn untyped_layers_are_inferred() {
        let json = r#"{
          "width": 1, "height": 1, "tilewidth": 8, "tileheight": 8,
          "layers": [
            {"name":"flat","data":[0]},
            {"name":"nest","layers":[{"name":"inner","data":[0]}]}
          ]
        }"#;
        let map = decode_map_str(json).unwrap();
        assert!(matches!(map.layers[0], LayerNode::Tiles(_)));
        assert!(matches!(map.layers[1], LayerNode::Group(_)));
    }

    #[test]
    fn base64_layers_are_rejected() {
        let json = r#"{
          "width": 1, "height": 1, "tilewidth": 8, "tileheight": 8,
          "layers": [{"type":"tilelayer","name":"packed","encoding":"base64","width":1,"height":1}]
        }"#;
        assert!(matches!(
            decode_map_str(json),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn zero_sized_map_is_invalid() {
        let json = r#"{"width":0,"height":1,"tilewidth":8,"tileheight":8,"layers":[]}"#;
        assert!(matches!(decode_map_str(json), Err(Error::InvalidMap(_))));
    }

    #[test]
    fn oversized_map_is_invalid() {
        let json = r#"{"width":70000,"height":1,"tilewidth":70000,"tileheight":8,"layers":[]}"#;
        assert!(matches!(decode_map_str(json), Err(Error::InvalidMap(_))));
    }

    #[test]
    fn tileset_ignores_extra_fields() {
        let json = r#"{
          "name":"Outdoor","image":"outdoor.png","tilecount":8,"columns":4,
          "tilewidth":12,"tileheight":12,"imagewidth":48,"imageheight":24,
          "margin":0,"spacing":0,"tiledversion":"1.8.2","type":"tileset","version":"1.8"
        }"#;
        let meta = decode_tileset_str(json).unwrap();
        assert_eq!(meta.name, "Outdoor");
        assert_eq!((meta.columns, meta.tile_count), (4, 8));
        assert_eq!((meta.image_width, meta.image_height), (48, 24));
    }

    #[test]
    fn tileset_paths_prefer_json_exports() {
        let dir = Path::new("maps");
        assert_eq!(tileset_path_for(dir, "A.tsx"), dir.join("A.json"));
        assert_eq!(tileset_path_for(dir, "B.json"), dir.join("B.json"));
        assert_eq!(tileset_path_for(dir, "C"), dir.join("C.json"));
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(matches!(decode_map_str("{ not json"), Err(Error::Json { .. })));
    }
}
