//! Flat-string encoding of per-page records.
//!
//! Four separator tiers, from outermost to innermost:
//!
//! | constant               | token  | joins                                  |
//! |------------------------|--------|----------------------------------------|
//! | [`RECORD_SEPARATOR`]   | `|||`  | layout records, folder records         |
//! | [`FIELD_SEPARATOR`]    | `~~`   | fields of a layout or folder record    |
//! | [`POSITION_SEPARATOR`] | `;`    | entries of a position blob             |
//! | [`LIST_SEPARATOR`]     | `,`    | fields of one position, app lists      |
//!
//! Decoding never fails. Blank segments are skipped, a record with too few
//! fields is dropped on its own, and unparsable numbers fall back to their
//! defaults. String fields must not contain a separator token; they are not
//! escaped.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use uuid::Uuid;

use hearth_types::app::{AppPosition, DEFAULT_ICON_SIZE};

use crate::folders::AppFolder;
use crate::layouts::AppLayout;

pub const RECORD_SEPARATOR: &str = "|||";
pub const FIELD_SEPARATOR: &str = "~~";
pub const POSITION_SEPARATOR: &str = ";";
pub const LIST_SEPARATOR: &str = ",";

/// Coordinate used when a stored coordinate is missing or unparsable.
pub const DEFAULT_COORDINATE: f32 = 0.0;

const POSITION_MIN_FIELDS: usize = 3;
const LAYOUT_MIN_FIELDS: usize = 3;
const FOLDER_MIN_FIELDS: usize = 3;

// -- Keys ---------------------------------------------------------------------

/// Store key for `page` under `prefix`, e.g. `positions_page_2`.
pub fn page_key(prefix: &str, page: usize) -> String {
    format!("{prefix}{page}")
}

/// Inverse of [`page_key`]. `None` if `key` does not match `prefix<digits>`.
pub fn parse_page_key(key: &str, prefix: &str) -> Option<usize> {
    let rest = key.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

// -- Scalars ------------------------------------------------------------------

fn parse_or<T: FromStr>(field: Option<&str>, default: T) -> T {
    field.and_then(|f| f.trim().parse().ok()).unwrap_or(default)
}

fn parse_f32_or(field: Option<&str>, default: f32) -> f32 {
    let v = parse_or(field, default);
    if v.is_finite() { v } else { default }
}

fn segments<'a>(raw: &'a str, sep: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    raw.split(sep).filter(|s| !s.trim().is_empty())
}

// -- Positions ----------------------------------------------------------------

fn encode_position(p: &AppPosition) -> String {
    [
        p.package_name.clone(),
        p.x.to_string(),
        p.y.to_string(),
        p.icon_size.to_string(),
    ]
    .join(LIST_SEPARATOR)
}

fn decode_position(entry: &str) -> Option<AppPosition> {
    let fields: Vec<&str> = entry.split(LIST_SEPARATOR).collect();
    if fields.len() < POSITION_MIN_FIELDS || fields[0].is_empty() {
        log::warn!("Dropping malformed position entry: {entry:?}");
        return None;
    }
    Some(AppPosition {
        package_name: fields[0].to_string(),
        x: parse_f32_or(fields.get(1).copied(), DEFAULT_COORDINATE),
        y: parse_f32_or(fields.get(2).copied(), DEFAULT_COORDINATE),
        icon_size: parse_f32_or(fields.get(3).copied(), DEFAULT_ICON_SIZE),
    })
}

/// `pkg,x,y,size;pkg,x,y,size`
pub fn encode_positions<'a, I>(positions: I) -> String
where
    I: IntoIterator<Item = &'a AppPosition>,
{
    positions
        .into_iter()
        .map(encode_position)
        .collect::<Vec<_>>()
        .join(POSITION_SEPARATOR)
}

pub fn decode_positions(raw: &str) -> Vec<AppPosition> {
    segments(raw, POSITION_SEPARATOR)
        .filter_map(decode_position)
        .collect()
}

/// Decode into a map keyed by package name. A later duplicate wins.
pub fn decode_position_map(raw: &str) -> BTreeMap<String, AppPosition> {
    decode_positions(raw)
        .into_iter()
        .map(|p| (p.package_name.clone(), p))
        .collect()
}

// -- Layouts ------------------------------------------------------------------

fn encode_layout(layout: &AppLayout) -> String {
    [
        layout.id.to_string(),
        layout.name.clone(),
        layout.timestamp.to_string(),
        encode_positions(layout.positions.values()),
    ]
    .join(FIELD_SEPARATOR)
}

fn decode_layout(record: &str) -> Option<AppLayout> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    if fields.len() < LAYOUT_MIN_FIELDS {
        log::warn!("Dropping layout record with {} field(s)", fields.len());
        return None;
    }
    let Ok(id) = Uuid::parse_str(fields[0].trim()) else {
        log::warn!("Dropping layout record with bad id: {:?}", fields[0]);
        return None;
    };
    Some(AppLayout {
        id,
        name: fields[1].to_string(),
        timestamp: parse_or(fields.get(2).copied(), 0),
        positions: fields
            .get(3)
            .copied()
            .map(decode_position_map)
            .unwrap_or_default(),
    })
}

/// `id~~name~~timestamp~~positionBlob|||...`
pub fn encode_layouts(layouts: &[AppLayout]) -> String {
    layouts
        .iter()
        .map(encode_layout)
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

pub fn decode_layouts(raw: &str) -> Vec<AppLayout> {
    segments(raw, RECORD_SEPARATOR)
        .filter_map(decode_layout)
        .collect()
}

// -- Folders ------------------------------------------------------------------

fn encode_folder(folder: &AppFolder) -> String {
    [
        folder.id.to_string(),
        folder.name.clone(),
        folder.apps.join(LIST_SEPARATOR),
        folder.x.to_string(),
        folder.y.to_string(),
        folder.icon_size.to_string(),
    ]
    .join(FIELD_SEPARATOR)
}

fn decode_folder(record: &str) -> Option<AppFolder> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    if fields.len() < FOLDER_MIN_FIELDS {
        log::warn!("Dropping folder record with {} field(s)", fields.len());
        return None;
    }
    let Ok(id) = Uuid::parse_str(fields[0].trim()) else {
        log::warn!("Dropping folder record with bad id: {:?}", fields[0]);
        return None;
    };
    let mut folder = AppFolder {
        id,
        name: fields[1].to_string(),
        apps: Vec::new(),
        x: parse_f32_or(fields.get(3).copied(), DEFAULT_COORDINATE),
        y: parse_f32_or(fields.get(4).copied(), DEFAULT_COORDINATE),
        icon_size: parse_f32_or(fields.get(5).copied(), DEFAULT_ICON_SIZE),
    };
    for app in segments(fields[2], LIST_SEPARATOR) {
        folder.add_app(app);
    }
    Some(folder)
}

/// `id~~name~~a,b,c~~x~~y~~size|||...`
pub fn encode_folders(folders: &[AppFolder]) -> String {
    folders
        .iter()
        .map(encode_folder)
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

pub fn decode_folders(raw: &str) -> Vec<AppFolder> {
    segments(raw, RECORD_SEPARATOR)
        .filter_map(decode_folder)
        .collect()
}

// -- Sets ---------------------------------------------------------------------

/// Comma-joined, in sorted order.
pub fn encode_set(set: &BTreeSet<String>) -> String {
    set.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

pub fn decode_set(raw: &str) -> BTreeSet<String> {
    segments(raw, LIST_SEPARATOR).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(pkg: &str, x: f32, y: f32, size: f32) -> AppPosition {
        AppPosition::new(pkg, x, y).with_icon_size(size)
    }

    fn layout(name: &str, positions: &[AppPosition]) -> AppLayout {
        AppLayout {
            id: Uuid::new_v4(),
            name: name.to_string(),
            positions: positions
                .iter()
                .map(|p| (p.package_name.clone(), p.clone()))
                .collect(),
            timestamp: 1_700_000_000_123,
        }
    }

    // -- keys --

    #[test]
    fn page_key_roundtrip() {
        let k = page_key("positions_page_", 12);
        assert_eq!(k, "positions_page_12");
        assert_eq!(parse_page_key(&k, "positions_page_"), Some(12));
    }

    #[test]
    fn parse_page_key_rejects_foreign_keys() {
        assert_eq!(parse_page_key("folders_page_1", "positions_page_"), None);
        assert_eq!(parse_page_key("positions_page_", "positions_page_"), None);
        assert_eq!(parse_page_key("positions_page_1x", "positions_page_"), None);
        assert_eq!(parse_page_key("positions_page_-1", "positions_page_"), None);
    }

    // -- positions --

    #[test]
    fn position_wire_format() {
        let s = encode_positions(&[pos("a.b", 1.5, 2.0, 64.0), pos("c.d", 0.0, 10.0, 48.0)]);
        assert_eq!(s, "a.b,1.5,2,64;c.d,0,10,48");
    }

    #[test]
    fn position_roundtrip() {
        let input = vec![pos("org.mail", 12.25, -3.5, 72.0), pos("org.maps", 0.1, 0.2, 64.0)];
        assert_eq!(decode_positions(&encode_positions(&input)), input);
    }

    #[test]
    fn position_missing_size_defaults() {
        let out = decode_positions("a.b,3,4");
        assert_eq!(out, vec![pos("a.b", 3.0, 4.0, DEFAULT_ICON_SIZE)]);
    }

    #[test]
    fn position_bad_numbers_default() {
        let out = decode_positions("a.b,oops,NaN,big");
        assert_eq!(
            out,
            vec![pos("a.b", DEFAULT_COORDINATE, DEFAULT_COORDINATE, DEFAULT_ICON_SIZE)]
        );
    }

    #[test]
    fn position_short_record_dropped_rest_kept() {
        let out = decode_positions("a.b,1;;  ;c.d,5,6,32;,1,2");
        assert_eq!(out, vec![pos("c.d", 5.0, 6.0, 32.0)]);
    }

    #[test]
    fn position_empty_input() {
        assert!(decode_positions("").is_empty());
        assert_eq!(encode_positions(&[]), "");
    }

    #[test]
    fn position_map_later_duplicate_wins() {
        let map = decode_position_map("a,1,1;a,2,2");
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"].x, 2.0);
    }

    // -- layouts --

    #[test]
    fn layout_roundtrip() {
        let input = vec![
            layout("Work", &[pos("a", 1.0, 2.0, 64.0), pos("b", 3.0, 4.0, 50.0)]),
            layout("Empty", &[]),
        ];
        assert_eq!(decode_layouts(&encode_layouts(&input)), input);
    }

    #[test]
    fn layout_wire_format() {
        let l = layout("Home", &[pos("a", 1.0, 2.0, 64.0)]);
        let s = encode_layouts(std::slice::from_ref(&l));
        assert_eq!(s, format!("{}~~Home~~1700000000123~~a,1,2,64", l.id));
    }

    #[test]
    fn layout_without_blob_is_kept() {
        let id = Uuid::new_v4();
        let out = decode_layouts(&format!("{id}~~Bare~~5"));
        assert_eq!(out.len(), 1);
        assert!(out[0].positions.is_empty());
        assert_eq!(out[0].timestamp, 5);
    }

    #[test]
    fn layout_bad_id_dropped_rest_kept() {
        let good = layout("Good", &[pos("a", 1.0, 1.0, 64.0)]);
        let raw = format!("nope~~Bad~~1~~a,1,1|||{}", encode_layouts(&[good.clone()]));
        assert_eq!(decode_layouts(&raw), vec![good]);
    }

    #[test]
    fn layout_short_record_dropped() {
        assert!(decode_layouts("only~~two").is_empty());
    }

    #[test]
    fn layout_bad_timestamp_defaults() {
        let id = Uuid::new_v4();
        let out = decode_layouts(&format!("{id}~~T~~yesterday~~"));
        assert_eq!(out[0].timestamp, 0);
    }

    // -- folders --

    #[test]
    fn folder_roundtrip() {
        let mut f = AppFolder::new("Games", ["g.one", "g.two"], 120.0, 40.5);
        f.icon_size = 80.0;
        let input = vec![f, AppFolder::new("Solo", ["s"], 0.0, 0.0)];
        assert_eq!(decode_folders(&encode_folders(&input)), input);
    }

    #[test]
    fn folder_wire_format() {
        let f = AppFolder::new("Games", ["g.one", "g.two"], 1.0, 2.0);
        assert_eq!(
            encode_folders(std::slice::from_ref(&f)),
            format!("{}~~Games~~g.one,g.two~~1~~2~~64", f.id)
        );
    }

    #[test]
    fn folder_missing_numbers_default() {
        let id = Uuid::new_v4();
        let out = decode_folders(&format!("{id}~~F~~a,b"));
        assert_eq!(out[0].x, DEFAULT_COORDINATE);
        assert_eq!(out[0].icon_size, DEFAULT_ICON_SIZE);
        assert_eq!(out[0].apps, vec!["a", "b"]);
    }

    #[test]
    fn folder_duplicate_apps_collapsed() {
        let id = Uuid::new_v4();
        let out = decode_folders(&format!("{id}~~F~~a,b,a,,b~~1~~2~~3"));
        assert_eq!(out[0].apps, vec!["a", "b"]);
    }

    #[test]
    fn folder_garbage_segments_skipped() {
        let f = AppFolder::new("Keep", ["k"], 1.0, 1.0);
        let raw = format!("|||junk|||{}||| |||", encode_folders(std::slice::from_ref(&f)));
        assert_eq!(decode_folders(&raw), vec![f]);
    }

    // -- sets --

    #[test]
    fn set_is_sorted_and_skips_blanks() {
        let set = decode_set("z.app,,a.app, ,m.app");
        assert_eq!(encode_set(&set), "a.app,m.app,z.app");
    }

    #[test]
    fn set_empty() {
        assert!(decode_set("").is_empty());
        assert_eq!(encode_set(&BTreeSet::new()), "");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn finite() -> impl Strategy<Value = f32> {
            -10_000.0f32..10_000.0f32
        }

        fn position() -> impl Strategy<Value = AppPosition> {
            ("[a-z][a-z0-9_.]{0,20}", finite(), finite(), 1.0f32..512.0f32)
                .prop_map(|(pkg, x, y, s)| AppPosition::new(pkg, x, y).with_icon_size(s))
        }

        proptest! {
            #[test]
            fn positions_roundtrip(list in proptest::collection::vec(position(), 0..12)) {
                prop_assert_eq!(decode_positions(&encode_positions(&list)), list);
            }

            #[test]
            fn layouts_roundtrip(
                name in "[A-Za-z0-9 _.-]{0,24}",
                list in proptest::collection::vec(position(), 0..8),
                timestamp in 0i64..i64::MAX,
            ) {
                let l = AppLayout {
                    id: Uuid::new_v4(),
                    name,
                    positions: list.into_iter().map(|p| (p.package_name.clone(), p)).collect(),
                    timestamp,
                };
                let out = decode_layouts(&encode_layouts(std::slice::from_ref(&l)));
                prop_assert_eq!(out, vec![l]);
            }

            #[test]
            fn folders_roundtrip(
                name in "[A-Za-z0-9 _.-]{0,24}",
                apps in proptest::collection::btree_set("[a-z][a-z0-9.]{0,12}", 1..6),
                x in finite(),
                y in finite(),
            ) {
                let f = AppFolder::new(name, apps, x, y);
                let out = decode_folders(&encode_folders(std::slice::from_ref(&f)));
                prop_assert_eq!(out, vec![f]);
            }

            #[test]
            fn decode_never_panics(raw in ".{0,200}") {
                let _ = decode_positions(&raw);
                let _ = decode_layouts(&raw);
                let _ = decode_folders(&raw);
                let _ = decode_set(&raw);
            }
        }
    }
}
