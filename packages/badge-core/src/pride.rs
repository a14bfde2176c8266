//! Pride Flags
//!
//! Bar patterns of the pride flags the badge can show, top stripe first.

use crate::led::{RGB8, BAR_LED_COUNT};

/// One flag stretched over the bar
pub type Flag = [RGB8; BAR_LED_COUNT];

const fn rgb(hex: u32) -> RGB8 {
    RGB8::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Lays out `(color, pixels)` stripes along the bar
const fn stripes<const N: usize>(stripes: [(u32, usize); N]) -> Flag {
    let mut bar = [RGB8::new(0, 0, 0); BAR_LED_COUNT];
    let mut pixel = 0;
    let mut stripe = 0;
    while stripe < N {
        let (hex, count) = stripes[stripe];
        let mut n = 0;
        while n < count && pixel < BAR_LED_COUNT {
            bar[pixel] = rgb(hex);
            pixel += 1;
            n += 1;
        }
        stripe += 1;
    }
    bar
}

pub const LGBT: Flag = stripes([
    (0xFE0000, 2),
    (0xFF8E01, 2),
    (0xFFEE00, 2),
    (0x028215, 2),
    (0x014CFF, 2),
    (0x8A018C, 1),
]);

pub const LGBTQI: Flag = stripes([
    (0xFFD800, 1),
    (0x7902AA, 1),
    (0xFFFFFF, 1),
    (0xF5A9B8, 1),
    (0x5BCEFA, 1),
    (0x613915, 1),
    (0xE40303, 1),
    (0xFF8C00, 1),
    (0xFFED00, 1),
    (0x008026, 1),
    (0x24408E, 1),
]);

pub const BISEXUAL: Flag = stripes([(0xD70071, 4), (0x9C4E97, 3), (0x0035AA, 4)]);

pub const POLYAMOROUS: Flag = stripes([
    (0xFFFFFF, 1),
    (0xFCBF00, 1),
    (0x009FE3, 3),
    (0xE50051, 3),
    (0x340C46, 3),
]);

pub const POLYSEXUAL: Flag = stripes([(0xC84793, 4), (0x4BB166, 3), (0x4288C8, 4)]);

pub const TRANSGENDER: Flag = stripes([
    (0x73CFF4, 2),
    (0xE76E8E, 2),
    (0xFFFFFF, 3),
    (0xE76E8E, 2),
    (0x73CFF4, 2),
]);

pub const PANSEXUAL: Flag = stripes([(0xE5318A, 4), (0xFED905, 3), (0x4AAAE0, 4)]);

pub const ASEXUAL: Flag = stripes([(0x080808, 3), (0x605040, 3), (0xFFFFFF, 2), (0x7B217F, 3)]);

pub const GENDERFLUID: Flag = stripes([
    (0xCA5982, 2),
    (0xFFFFFF, 2),
    (0x882694, 3),
    (0x080808, 2),
    (0x374A99, 2),
]);

pub const GENDERQUEER: Flag = stripes([(0xB57EDC, 4), (0xFFFFFF, 3), (0x4A8123, 4)]);

pub const NONBINARY: Flag = stripes([(0xFFF430, 3), (0xFFFFFF, 2), (0x9C59D1, 3), (0x080808, 3)]);

pub const INTERSEX: Flag = stripes([(0xFFD800, 4), (0x7902AA, 3), (0xFFD800, 4)]);

/// All flags in selection order
pub const FLAGS: [&Flag; 12] = [
    &LGBT,
    &LGBTQI,
    &BISEXUAL,
    &POLYAMOROUS,
    &POLYSEXUAL,
    &TRANSGENDER,
    &PANSEXUAL,
    &ASEXUAL,
    &GENDERFLUID,
    &GENDERQUEER,
    &NONBINARY,
    &INTERSEX,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripes_fill_whole_bar() {
        assert_eq!(LGBT[0], rgb(0xFE0000));
        assert_eq!(LGBT[10], rgb(0x8A018C));
        assert_eq!(BISEXUAL[4], rgb(0x9C4E97));
        assert_eq!(TRANSGENDER[5], RGB8::new(255, 255, 255));
    }
}
