//! Plain-text world dump.

use std::fmt::Write as _;

use emberlink::world::Entity;

/// One block per entity: a header line, then its position if known.
///
/// ```text
/// 2 Entities:
/// == Orc ==
///  at 3, 4
/// == None ==
/// ```
pub fn render(entities: &[Entity]) -> String {
    let mut out = format!("{} Entities:\n", entities.len());
    for entity in entities {
        let _ = writeln!(out, "== {} ==", entity.name().unwrap_or("None"));
        if let Some((x, y)) = entity.position_2d() {
            let _ = writeln!(out, " at {}, {}", x as i64, y as i64);
        }
    }
    out
}
