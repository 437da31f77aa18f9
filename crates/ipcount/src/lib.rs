//! Counts unique IPv4 addresses in very large line-oriented files.
//!
//! A naive set of dotted-quad strings needs tens of bytes per address; at a
//! billion uniques that is tens of gigabytes for the set alone. Instead each
//! address is packed into a `u32` and deduplicated in a bitmap over the full
//! 2^32 address space. The bitmap is paged so inputs that touch only part of
//! the space do not pin the worst-case half gigabyte.
//!
//! ```
//! use std::io::Cursor;
//!
//! let input = Cursor::new("10.0.0.1\n10.0.0.2\n10.0.0.1\n");
//! assert_eq!(ipcount::count_unique(input).unwrap(), 2);
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

/// High bits of a packed address select the page.
const PAGE_SHIFT: u32 = 24;
/// Low bits select the bit within the page.
const OFFSET_MASK: u32 = 0x00FF_FFFF;
const PAGE_COUNT: usize = 1 << (32 - PAGE_SHIFT);
const WORDS_PER_PAGE: usize = 1 << (PAGE_SHIFT - 6);

/// Packs a dotted-quad IPv4 address (`"203.0.113.9"`) into its numeric
/// form, most significant octet first.
///
/// This is a bare byte fold: digits accumulate into the current octet and
/// each dot shifts the accumulator left. There is no validation; the input
/// contract is one well-formed address, which is what line-per-address
/// files contain, and the fold is only meaningful under it.
#[must_use]
pub fn pack_ipv4(line: &str) -> u32 {
    let mut packed = 0u32;
    let mut octet = 0u32;
    for byte in line.bytes() {
        if byte == b'.' {
            packed = (packed << 8) | octet;
            octet = 0;
        } else {
            octet = octet * 10 + u32::from(byte - b'0');
        }
    }
    (packed << 8) | octet
}

/// A set of packed addresses.
///
/// The counting loop needs only insertion and a final distinct count, so
/// alternative backings (a hash set for sparse inputs, sorted runs for
/// merge jobs) plug in behind this trait.
pub trait IpAccumulator {
    /// Records one packed address.
    fn insert(&mut self, packed: u32);

    /// Number of distinct addresses recorded so far.
    fn distinct(&self) -> u64;
}

/// A 2^32-bit membership bitmap split into 256 lazily allocated pages.
///
/// A flat bitmap over the whole IPv4 space costs 512 MiB up front. Real
/// inputs cluster, so each page (2^24 addresses, 2 MiB of words) is
/// allocated on first touch; an input confined to a few /8 blocks pays
/// only for those.
pub struct PagedBitmap {
    pages: Vec<Option<Box<[u64]>>>,
    distinct: u64,
}

impl PagedBitmap {
    /// An empty bitmap with no pages allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: vec![None; PAGE_COUNT],
            distinct: 0,
        }
    }

    /// Bytes currently held by allocated pages.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.pages.iter().flatten().count() * WORDS_PER_PAGE * size_of::<u64>()
    }
}

impl Default for PagedBitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl IpAccumulator for PagedBitmap {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "page index and bit offset fit usize on all supported targets"
    )]
    fn insert(&mut self, packed: u32) {
        let page = (packed >> PAGE_SHIFT) as usize;
        let offset = (packed & OFFSET_MASK) as usize;
        let words = self.pages[page]
            .get_or_insert_with(|| vec![0u64; WORDS_PER_PAGE].into_boxed_slice());
        let word = &mut words[offset / 64];
        let bit = 1u64 << (offset % 64);
        if *word & bit == 0 {
            *word |= bit;
            self.distinct += 1;
        }
    }

    fn distinct(&self) -> u64 {
        self.distinct
    }
}

/// Streams addresses from `reader` into `acc`, one per line, and returns
/// the distinct count.
///
/// The line buffer is reused across reads, so the loop allocates nothing
/// per line. Trailing `\r`/`\n` are stripped; everything else on the line
/// is fed to [`pack_ipv4`] as is.
pub fn count_unique_with<R: BufRead, A: IpAccumulator>(
    mut reader: R,
    acc: &mut A,
) -> io::Result<u64> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        acc.insert(pack_ipv4(line.trim_end_matches(['\r', '\n'])));
    }
    Ok(acc.distinct())
}

/// Counts distinct addresses in `reader` with a fresh [`PagedBitmap`].
pub fn count_unique<R: BufRead>(reader: R) -> io::Result<u64> {
    let mut bitmap = PagedBitmap::new();
    count_unique_with(reader, &mut bitmap)
}

/// Opens `path` with buffered reads and counts its distinct addresses.
pub fn count_unique_in_file(path: impl AsRef<Path>) -> io::Result<u64> {
    let file = File::open(path)?;
    count_unique(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, io::Cursor};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn packs_known_addresses() {
        assert_eq!(pack_ipv4("1.2.3.4"), 0x0102_0304);
        assert_eq!(pack_ipv4("0.0.0.0"), 0);
        assert_eq!(pack_ipv4("255.255.255.255"), u32::MAX);
        assert_eq!(pack_ipv4("192.168.0.1"), 0xC0A8_0001);
        assert_eq!(pack_ipv4("9.100.3.250"), 0x0964_03FA);
    }

    #[test]
    fn bitmap_deduplicates() {
        let mut bitmap = PagedBitmap::new();
        bitmap.insert(pack_ipv4("10.0.0.1"));
        bitmap.insert(pack_ipv4("10.0.0.1"));
        bitmap.insert(pack_ipv4("10.0.0.2"));
        assert_eq!(bitmap.distinct(), 2);
    }

    /// Addresses on either side of a page boundary land in different pages
    /// and must both count.
    #[test]
    fn page_boundaries_are_distinct() {
        let mut bitmap = PagedBitmap::new();
        bitmap.insert(pack_ipv4("0.255.255.255"));
        bitmap.insert(pack_ipv4("1.0.0.0"));
        bitmap.insert(pack_ipv4("0.0.0.0"));
        bitmap.insert(pack_ipv4("255.255.255.255"));
        assert_eq!(bitmap.distinct(), 4);
    }

    #[test]
    fn pages_allocate_on_first_touch() {
        let mut bitmap = PagedBitmap::new();
        assert_eq!(bitmap.allocated_bytes(), 0);

        bitmap.insert(pack_ipv4("10.0.0.1"));
        let one_page = WORDS_PER_PAGE * size_of::<u64>();
        assert_eq!(bitmap.allocated_bytes(), one_page);

        // Same page: no new allocation.
        bitmap.insert(pack_ipv4("10.200.30.40"));
        assert_eq!(bitmap.allocated_bytes(), one_page);

        // Different high octet: second page.
        bitmap.insert(pack_ipv4("11.0.0.1"));
        assert_eq!(bitmap.allocated_bytes(), 2 * one_page);
    }

    #[test]
    fn counts_streamed_lines() {
        let input = Cursor::new("145.67.23.4\n8.34.5.23\n89.54.3.124\n89.54.3.124\n3.45.71.5\n");
        assert_eq!(count_unique(input).unwrap(), 4);
    }

    #[test]
    fn handles_crlf_and_missing_final_newline() {
        let input = Cursor::new("1.1.1.1\r\n2.2.2.2\r\n1.1.1.1");
        assert_eq!(count_unique(input).unwrap(), 2);
    }

    #[test]
    fn empty_input_counts_zero() {
        assert_eq!(count_unique(Cursor::new("")).unwrap(), 0);
    }

    /// The accumulator seam accepts other containers.
    #[test]
    fn custom_accumulator_plugs_in() {
        struct HashAccumulator(HashSet<u32>);

        impl IpAccumulator for HashAccumulator {
            fn insert(&mut self, packed: u32) {
                self.0.insert(packed);
            }

            fn distinct(&self) -> u64 {
                self.0.len() as u64
            }
        }

        let mut acc = HashAccumulator(HashSet::new());
        let input = Cursor::new("7.7.7.7\n7.7.7.7\n8.8.8.8\n");
        assert_eq!(count_unique_with(input, &mut acc).unwrap(), 2);
        assert!(acc.0.contains(&pack_ipv4("8.8.8.8")));
    }

    #[test]
    fn counts_a_real_file() {
        let path = std::env::temp_dir().join(format!("ipcount-test-{}", std::process::id()));
        std::fs::write(&path, "203.0.113.9\n203.0.113.9\n198.51.100.1\n").unwrap();
        let count = count_unique_in_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(count_unique_in_file("/nonexistent/ipcount-input").is_err());
    }
}
