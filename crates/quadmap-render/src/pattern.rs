//! Pattern selection: which variant of a sprite a given item shows.
//!
//! Pure functions of their inputs; the only time dependency is the clock
//! handed in for animated sprites.

use quadmap_geom::Position;
use quadmap_items::{ItemType, SpriteMeta, SpritePatterns};

/// Hook walls present on the tile, which decide how hangables face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileHooks {
    pub south: bool,
    pub east: bool,
}

/// `coord mod size` for one pattern axis; sizes of 0 or 1 pin the axis to 0.
#[inline]
pub fn axis_offset(coord: i32, size: u8) -> u32 {
    match size {
        0 | 1 => 0,
        s if s.is_power_of_two() => (coord & (i32::from(s) - 1)) as u32,
        s => coord.rem_euclid(i32::from(s)) as u32,
    }
}

/// Count bucket used to pick a stack sprite.
#[inline]
pub fn stack_bucket(count: u16) -> i32 {
    match count {
        0..=1 => 0,
        2 => 1,
        3 => 2,
        4 => 3,
        5..=9 => 4,
        10..=24 => 5,
        25..=49 => 6,
        _ => 7,
    }
}

/// Resolves the pattern for one item draw.
///
/// `clock_ms` is `Some` when animation is live; otherwise animated sprites
/// show their start frame.
pub fn resolve_patterns(
    sprite: Option<&SpriteMeta>,
    ty: &ItemType,
    subtype: u16,
    hooks: TileHooks,
    pos: Position,
    clock_ms: Option<u64>,
) -> SpritePatterns {
    let Some(spr) = sprite else {
        return SpritePatterns::default();
    };
    let mut p = SpritePatterns {
        x: axis_offset(pos.x, spr.pattern_x),
        y: axis_offset(pos.y, spr.pattern_y),
        z: axis_offset(pos.z, spr.pattern_z),
        frame: 0,
        subtype: -1,
    };
    if ty.is_hangable() {
        p.x = if hooks.south {
            1
        } else if hooks.east {
            2
        } else {
            0
        };
    } else if ty.is_stackable() {
        p.subtype = stack_bucket(subtype);
    } else if ty.is_splash() || ty.is_fluid_container() {
        p.subtype = i32::from(subtype);
    }
    p.frame = match (&spr.animator, clock_ms) {
        (Some(anim), Some(clock)) => anim.frame_at(clock),
        (Some(anim), None) => anim.start_frame,
        (None, _) => 0,
    };
    p
}

/// Folds a subtype into the x/y pattern grid, which is how stack counts and
/// fluid kinds are laid out in their sprites.
pub fn apply_subtype(p: SpritePatterns, spr: &SpriteMeta) -> SpritePatterns {
    if p.subtype < 0 {
        return p;
    }
    let px = u32::from(spr.pattern_x.max(1));
    let py = u32::from(spr.pattern_y.max(1));
    if px * py <= 1 {
        return p;
    }
    let s = p.subtype as u32;
    SpritePatterns {
        x: s % px,
        y: (s / px) % py,
        ..p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadmap_items::{ItemFlags, SpriteMeta};

    fn ty(flags: ItemFlags) -> ItemType {
        ItemType {
            id: 1,
            sprite_id: 1,
            flags,
            ..Default::default()
        }
    }

    fn sprite(px: u8, py: u8) -> SpriteMeta {
        let mut s = SpriteMeta::simple(1, 0);
        s.pattern_x = px;
        s.pattern_y = py;
        s
    }

    #[test]
    fn absent_sprite_gives_default() {
        let p = resolve_patterns(
            None,
            &ty(ItemFlags::empty()),
            0,
            TileHooks::default(),
            Position::new(5, 5, 7),
            None,
        );
        assert_eq!(p, SpritePatterns::default());
        assert_eq!(p.subtype, -1);
    }

    #[test]
    fn hangable_faces_hook_with_south_first() {
        let s = sprite(3, 1);
        let t = ty(ItemFlags::HANGABLE);
        let pos = Position::new(7, 7, 7);
        let both = TileHooks {
            south: true,
            east: true,
        };
        assert_eq!(resolve_patterns(Some(&s), &t, 0, both, pos, None).x, 1);
        let east = TileHooks {
            south: false,
            east: true,
        };
        assert_eq!(resolve_patterns(Some(&s), &t, 0, east, pos, None).x, 2);
        assert_eq!(
            resolve_patterns(Some(&s), &t, 0, TileHooks::default(), pos, None).x,
            0
        );
    }

    #[test]
    fn hangable_beats_stackable_and_fluid() {
        let s = sprite(3, 1);
        let t = ty(ItemFlags::HANGABLE | ItemFlags::STACKABLE | ItemFlags::SPLASH);
        let p = resolve_patterns(Some(&s), &t, 30, TileHooks::default(), Position::new(1, 1, 7), None);
        assert_eq!(p.subtype, -1);
        let t = ty(ItemFlags::STACKABLE | ItemFlags::SPLASH);
        let p = resolve_patterns(Some(&s), &t, 30, TileHooks::default(), Position::new(1, 1, 7), None);
        assert_eq!(p.subtype, 6);
    }

    #[test]
    fn fluid_subtype_is_raw_and_folds_into_grid() {
        let s = sprite(4, 2);
        let t = ty(ItemFlags::FLUID_CONTAINER);
        let p = resolve_patterns(Some(&s), &t, 5, TileHooks::default(), Position::new(0, 0, 7), None);
        assert_eq!(p.subtype, 5);
        let folded = apply_subtype(p, &s);
        assert_eq!((folded.x, folded.y), (1, 1));
    }

    #[test]
    fn bucket_table() {
        let expected = [
            (0, 0),
            (1, 0),
            (2, 1),
            (3, 2),
            (4, 3),
            (9, 4),
            (10, 5),
            (24, 5),
            (25, 6),
            (49, 6),
            (50, 7),
            (100, 7),
        ];
        for (count, bucket) in expected {
            assert_eq!(stack_bucket(count), bucket, "count {count}");
        }
    }
}
