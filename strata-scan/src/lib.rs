/*!
Fast byte scanning primitives.

## Features
- [`ByteSet`](bitmap::ByteSet) and the bitmap [class scanner](bitmap::ClassScanner)
- [Nibble-LUT](nibble) class scanning for sets with few distinct high nibbles
- [Two-Way](twoway) substring search (Crochemore–Perrin)
- [Multi-literal](teddy) first-byte fan-out scanning

Everything here operates on plain `&[u8]` haystacks. The scan loops are
written in fixed-width chunks so the compiler can vectorize them; single-byte
skips go through `memchr`.
*/
pub mod bitmap;
pub mod nibble;
pub mod teddy;
pub mod twoway;

pub use bitmap::ByteSet;
