use std::ops::RangeInclusive;

pub trait GetBit: Copy {
    #[must_use]
    fn bit(self, i: u8) -> bool;

    #[must_use]
    fn bits(self, range: RangeInclusive<u8>) -> Self;

    #[must_use]
    fn with_bit(self, i: u8, value: bool) -> Self;
}

macro_rules! impl_get_bit {
    ($t:ty) => {
        impl GetBit for $t {
            #[inline]
            fn bit(self, i: u8) -> bool {
                debug_assert!(i < (<$t>::BITS as u8));
                self & (1 << i) != 0
            }

            #[inline]
            fn bits(self, range: RangeInclusive<u8>) -> Self {
                let start = *range.start();
                let end = *range.end();
                debug_assert!(end < (<$t>::BITS as u8));

                let len = end - start + 1;
                if u32::from(len) == <$t>::BITS {
                    self
                } else {
                    (self >> start) & ((1 << len) - 1)
                }
            }

            #[inline]
            fn with_bit(self, i: u8, value: bool) -> Self {
                debug_assert!(i < (<$t>::BITS as u8));
                (self & !(1 << i)) | (<$t>::from(value) << i)
            }
        }
    };
}

impl_get_bit!(u8);
impl_get_bit!(u16);
impl_get_bit!(u32);
impl_get_bit!(u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_ranges() {
        assert_eq!(0b1101_0100_u16.bits(2..=4), 0b101);
        assert_eq!(0xABCD_u16.bits(0..=15), 0xABCD);
        assert_eq!(0x8000_0000_0000_0001_u64.bits(63..=63), 1);
    }

    #[test]
    fn set_and_clear_bits() {
        assert_eq!(0_u8.with_bit(3, true), 0b1000);
        assert_eq!(0xFF_u8.with_bit(0, false), 0xFE);
        assert!(0_u32.with_bit(31, true).bit(31));
    }
}
