// LZX decoder (the variant used by XNA content builds).
//
// Bit-exact with the reference LZX decoder that XNA-compatible content
// loaders ship (libmspack lineage):
//
//   - Bits are read MSB-first from 16-bit little-endian words
//   - Three block types: verbatim, aligned-offset, uncompressed
//   - Huffman code lengths are delta-coded against the previous block's
//     lengths through a 20-symbol pretree
//   - Canonical decode tables with overflow links for codes longer than
//     the direct-lookup width
//   - Optional intel E8 call translation
//
// State (window, repeat offsets, code lengths, current block) persists
// across calls so consecutive frames can back-reference earlier output.

use crate::buffer::{ByteCursor, SeekOrigin};
use crate::error::{Result, XnbError};

// ---------------------------------------------------------------------------
// Format constants
// ---------------------------------------------------------------------------

const MIN_MATCH: usize = 2;
const NUM_CHARS: usize = 256;
const NUM_PRIMARY_LENGTHS: usize = 7;
const NUM_SECONDARY_LENGTHS: usize = 249;

const PRETREE_MAXSYMBOLS: usize = 20;
const PRETREE_TABLEBITS: u32 = 6;
const MAINTREE_MAXSYMBOLS: usize = NUM_CHARS + 50 * 8;
const MAINTREE_TABLEBITS: u32 = 12;
const LENGTH_MAXSYMBOLS: usize = NUM_SECONDARY_LENGTHS + 1;
const LENGTH_TABLEBITS: u32 = 12;
const ALIGNED_MAXSYMBOLS: usize = 8;
const ALIGNED_TABLEBITS: u32 = 7;

/// Slack after each length array so run-length codes near the end of a
/// range never index out of bounds.
const LENTABLE_SAFETY: usize = 64;

/// Marker for unfilled decode-table slots.
const EMPTY: u16 = 0xFFFF;

/// Frames after which intel E8 translation stops.
const E8_MAX_FRAMES: u32 = 32768;

/// Extra verbatim bits per position slot.
const EXTRA_BITS: [u8; 52] = {
    let mut table = [0u8; 52];
    let mut i = 0;
    let mut j = 0;
    while i <= 50 {
        table[i] = j;
        table[i + 1] = j;
        if i != 0 && j < 17 {
            j += 1;
        }
        i += 2;
    }
    table
};

/// First match offset (plus 2) covered by each position slot.
const POSITION_BASE: [u32; 51] = {
    let mut table = [0u32; 51];
    let mut i = 0;
    let mut j = 0u32;
    while i <= 50 {
        table[i] = j;
        j += 1 << EXTRA_BITS[i];
        i += 1;
    }
    table
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Invalid,
    Verbatim,
    Aligned,
    Uncompressed,
}

fn corrupt(msg: impl Into<String>) -> XnbError {
    XnbError::CorruptCompressedData(msg.into())
}

// ---------------------------------------------------------------------------
// Huffman trees
// ---------------------------------------------------------------------------

/// Code lengths plus the canonical decode table built from them.
#[derive(Debug, Clone)]
struct Tree {
    len: Vec<u8>,
    table: Vec<u16>,
    symbols: usize,
    bits: u32,
}

impl Tree {
    fn new(symbols: usize, bits: u32) -> Self {
        Self {
            len: vec![0; symbols + LENTABLE_SAFETY],
            table: vec![0; (1 << bits) + symbols * 2],
            symbols,
            bits,
        }
    }

    /// Build the decode table from `len`.
    ///
    /// Codes of up to `bits` bits are looked up directly; longer codes
    /// continue through binary tree nodes stored past the direct area.
    /// Fails when the lengths over-subscribe the code space. A table with
    /// every length zero is accepted (the tree is simply never used).
    fn build(&mut self) -> Result<()> {
        let nsyms = self.symbols;
        let nbits = self.bits;
        let len = &self.len[..nsyms];
        let table = &mut self.table;

        let mut pos: u32 = 0;
        let mut table_mask: u32 = 1 << nbits;
        let mut bit_mask: u32 = table_mask >> 1;

        for bit_num in 1..=nbits {
            for (sym, &l) in len.iter().enumerate() {
                if u32::from(l) != bit_num {
                    continue;
                }
                let leaf = pos as usize;
                pos += bit_mask;
                if pos > table_mask {
                    return Err(corrupt("Huffman table overrun"));
                }
                table[leaf..leaf + bit_mask as usize].fill(sym as u16);
            }
            bit_mask >>= 1;
        }

        if pos == table_mask {
            return Ok(());
        }

        table[pos as usize..table_mask as usize].fill(EMPTY);

        let mut next_symbol = if (table_mask >> 1) < nsyms as u32 {
            nsyms as u32
        } else {
            table_mask >> 1
        };
        pos <<= 16;
        table_mask <<= 16;
        bit_mask = 1 << 15;

        for bit_num in nbits + 1..=16 {
            for (sym, &l) in len.iter().enumerate() {
                if u32::from(l) != bit_num {
                    continue;
                }
                let mut leaf = (pos >> 16) as usize;
                for fill in 0..bit_num - nbits {
                    if table[leaf] == EMPTY {
                        let node = (next_symbol << 1) as usize;
                        if node + 1 >= table.len() {
                            return Err(corrupt("Huffman table overrun"));
                        }
                        table[node] = EMPTY;
                        table[node + 1] = EMPTY;
                        table[leaf] = next_symbol as u16;
                        next_symbol += 1;
                    }
                    leaf = usize::from(table[leaf]) << 1;
                    if (pos >> (15 - fill)) & 1 != 0 {
                        leaf += 1;
                    }
                    if leaf >= table.len() {
                        return Err(corrupt("Huffman table overrun"));
                    }
                }
                table[leaf] = sym as u16;
                pos += bit_mask;
                if pos > table_mask {
                    return Err(corrupt("Huffman table overrun"));
                }
            }
            bit_mask >>= 1;
        }

        if pos == table_mask || len.iter().all(|&l| l == 0) {
            Ok(())
        } else {
            Err(corrupt("incomplete Huffman code"))
        }
    }

    /// Decode one symbol and consume exactly its code length.
    fn read_symbol(&self, c: &mut ByteCursor) -> Result<usize> {
        let peek = c.peek_bits(16)?;
        let mut sym = usize::from(self.table[(peek >> (16 - self.bits)) as usize]);
        if sym >= self.symbols {
            let mut bit: u32 = 1 << (16 - self.bits);
            loop {
                bit >>= 1;
                if bit == 0 {
                    return Err(corrupt("Huffman code longer than 16 bits"));
                }
                sym <<= 1;
                if peek & bit != 0 {
                    sym |= 1;
                }
                sym = usize::from(
                    *self
                        .table
                        .get(sym)
                        .ok_or_else(|| corrupt("Huffman walk left the table"))?,
                );
                if sym < self.symbols {
                    break;
                }
            }
        }
        c.skip_bits(u32::from(self.len[sym]))?;
        Ok(sym)
    }
}

/// Read code lengths `first..last` into `lens`, delta-coded through the
/// pretree (which is itself re-read first).
fn read_lengths(
    pretree: &mut Tree,
    lens: &mut [u8],
    c: &mut ByteCursor,
    first: usize,
    last: usize,
) -> Result<()> {
    for slot in pretree.len.iter_mut().take(PRETREE_MAXSYMBOLS) {
        *slot = c.read_bits(4)? as u8;
    }
    pretree.build()?;

    let delta = |prev: u8, code: usize| ((i32::from(prev) - code as i32).rem_euclid(17)) as u8;

    let mut x = first;
    while x < last {
        let code = pretree.read_symbol(c)?;
        let (run, value) = match code {
            17 => (c.read_bits(4)? as usize + 4, 0),
            18 => (c.read_bits(5)? as usize + 20, 0),
            19 => {
                let run = c.read_bits(1)? as usize + 4;
                let code = pretree.read_symbol(c)?;
                (run, delta(lens[x], code))
            }
            _ => (1, delta(lens[x], code)),
        };
        let span = lens
            .get_mut(x..x + run)
            .ok_or_else(|| corrupt("code length run overflows the tree"))?;
        span.fill(value);
        x += run;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Stateful LZX decoder. One instance decodes one compressed stream.
#[derive(Debug, Clone)]
pub struct LzxDecoder {
    window: Vec<u8>,
    window_posn: usize,
    frame_posn: usize,
    /// Repeated-offset registers R0, R1, R2.
    r: [u32; 3],
    main_elements: usize,
    header_read: bool,
    block_type: BlockType,
    block_length: usize,
    block_remaining: usize,
    frames_read: u32,
    intel_filesize: i32,
    intel_curpos: i32,
    intel_started: bool,
    pretree: Tree,
    main: Tree,
    length: Tree,
    aligned: Tree,
}

impl LzxDecoder {
    /// Create a decoder for a `2^window_bits` byte window (15..=21).
    pub fn new(window_bits: u32) -> Result<Self> {
        let position_slots = match window_bits {
            15..=19 => window_bits as usize * 2,
            20 => 42,
            21 => 50,
            _ => {
                return Err(XnbError::UnsupportedFeature(format!(
                    "LZX window of {window_bits} bits"
                )));
            }
        };
        Ok(Self {
            window: vec![0; 1 << window_bits],
            window_posn: 0,
            frame_posn: 0,
            r: [1, 1, 1],
            main_elements: NUM_CHARS + position_slots * 8,
            header_read: false,
            block_type: BlockType::Invalid,
            block_length: 0,
            block_remaining: 0,
            frames_read: 0,
            intel_filesize: 0,
            intel_curpos: 0,
            intel_started: false,
            pretree: Tree::new(PRETREE_MAXSYMBOLS, PRETREE_TABLEBITS),
            main: Tree::new(MAINTREE_MAXSYMBOLS, MAINTREE_TABLEBITS),
            length: Tree::new(LENGTH_MAXSYMBOLS, LENGTH_TABLEBITS),
            aligned: Tree::new(ALIGNED_MAXSYMBOLS, ALIGNED_TABLEBITS),
        })
    }

    fn window_size(&self) -> usize {
        self.window.len()
    }

    /// Decode one frame of `frame_size` bytes from `c`, appending it to `out`.
    pub fn decompress(
        &mut self,
        c: &mut ByteCursor,
        frame_size: usize,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if self.frame_posn + frame_size > self.window_size() {
            return Err(corrupt(format!(
                "frame of {frame_size} bytes does not fit the window"
            )));
        }

        if !self.header_read {
            if c.read_bits(1)? != 0 {
                let hi = c.read_bits(16)?;
                let lo = c.read_bits(16)?;
                self.intel_filesize = ((hi << 16) | lo) as i32;
            }
            self.header_read = true;
        }

        let mut togo = (self.frame_posn + frame_size)
            .checked_sub(self.window_posn)
            .ok_or_else(|| corrupt("previous frame overran into this one"))?;

        while togo > 0 {
            if self.block_remaining == 0 {
                if self.block_type == BlockType::Uncompressed && self.block_length & 1 == 1 {
                    // Odd-length uncompressed blocks carry one pad byte.
                    c.seek(1, SeekOrigin::Current)?;
                }
                self.read_block_header(c)?;
            }

            while self.block_remaining > 0 && togo > 0 {
                let this_run = self.block_remaining.min(togo);
                togo -= this_run;
                self.block_remaining -= this_run;

                self.window_posn &= self.window_size() - 1;
                if self.window_posn + this_run > self.window_size() {
                    return Err(corrupt("run crosses the window boundary"));
                }

                let overrun = match self.block_type {
                    BlockType::Verbatim => self.decode_run(c, this_run, false)?,
                    BlockType::Aligned => self.decode_run(c, this_run, true)?,
                    BlockType::Uncompressed => {
                        let bytes = c.read_bytes(this_run)?;
                        let start = self.window_posn;
                        self.window[start..start + this_run].copy_from_slice(bytes);
                        self.window_posn += this_run;
                        0
                    }
                    BlockType::Invalid => return Err(corrupt("no active block")),
                };

                // A final match may run past the requested length; charge the
                // excess to the block.
                if overrun > 0 {
                    if overrun > self.block_remaining {
                        return Err(corrupt("match overruns the block"));
                    }
                    self.block_remaining -= overrun;
                }
            }
        }

        let start = out.len();
        out.extend_from_slice(&self.window[self.frame_posn..self.frame_posn + frame_size]);
        self.undo_e8(&mut out[start..]);

        self.frames_read += 1;
        self.frame_posn += frame_size;
        if self.frame_posn == self.window_size() {
            self.frame_posn = 0;
        }
        if self.window_posn == self.window_size() {
            self.window_posn = 0;
        }
        Ok(())
    }

    fn read_block_header(&mut self, c: &mut ByteCursor) -> Result<()> {
        let kind = c.read_bits(3)?;
        let hi = c.read_bits(16)? as usize;
        let lo = c.read_bits(8)? as usize;
        self.block_length = (hi << 8) | lo;
        self.block_remaining = self.block_length;

        self.block_type = match kind {
            1 => {
                self.read_main_trees(c)?;
                BlockType::Verbatim
            }
            2 => {
                for slot in self.aligned.len.iter_mut().take(ALIGNED_MAXSYMBOLS) {
                    *slot = c.read_bits(3)? as u8;
                }
                self.aligned.build()?;
                self.read_main_trees(c)?;
                BlockType::Aligned
            }
            3 => {
                self.intel_started = true;
                // 1-16 bits of padding up to the next word boundary.
                if c.bit_position() == 0 {
                    c.skip_bits(16)?;
                } else {
                    c.align()?;
                }
                for reg in &mut self.r {
                    let b = c.read_bytes(4)?;
                    *reg = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                }
                BlockType::Uncompressed
            }
            other => return Err(corrupt(format!("invalid block type {other}"))),
        };
        Ok(())
    }

    fn read_main_trees(&mut self, c: &mut ByteCursor) -> Result<()> {
        read_lengths(&mut self.pretree, &mut self.main.len, c, 0, NUM_CHARS)?;
        read_lengths(
            &mut self.pretree,
            &mut self.main.len,
            c,
            NUM_CHARS,
            self.main_elements,
        )?;
        self.main.build()?;
        if self.main.len[0xE8] != 0 {
            self.intel_started = true;
        }
        read_lengths(
            &mut self.pretree,
            &mut self.length.len,
            c,
            0,
            NUM_SECONDARY_LENGTHS,
        )?;
        self.length.build()
    }

    /// Decode literals and matches until at least `run` bytes are produced.
    /// Returns how many bytes the final match produced beyond `run`.
    fn decode_run(&mut self, c: &mut ByteCursor, run: usize, aligned: bool) -> Result<usize> {
        let mut produced = 0;
        while produced < run {
            let element = self.main.read_symbol(c)?;
            if element < NUM_CHARS {
                self.window[self.window_posn] = element as u8;
                self.window_posn += 1;
                produced += 1;
                continue;
            }

            let element = element - NUM_CHARS;
            let mut match_length = element & NUM_PRIMARY_LENGTHS;
            if match_length == NUM_PRIMARY_LENGTHS {
                match_length += self.length.read_symbol(c)?;
            }
            match_length += MIN_MATCH;

            let offset = self.match_offset(c, element >> 3, aligned)?;
            self.copy_match(offset as usize, match_length)?;
            produced += match_length;
        }
        Ok(produced - run)
    }

    fn match_offset(&mut self, c: &mut ByteCursor, slot: usize, aligned: bool) -> Result<u32> {
        let offset = match slot {
            0 => return Ok(self.r[0]),
            1 => {
                self.r.swap(0, 1);
                return Ok(self.r[0]);
            }
            2 => {
                self.r.swap(0, 2);
                return Ok(self.r[0]);
            }
            _ => {
                let extra = u32::from(EXTRA_BITS[slot]);
                let base = POSITION_BASE[slot] - 2;
                if !aligned {
                    base + read_wide_bits(c, extra)?
                } else if extra > 3 {
                    let verbatim = read_wide_bits(c, extra - 3)?;
                    base + (verbatim << 3) + self.aligned.read_symbol(c)? as u32
                } else if extra == 3 {
                    base + self.aligned.read_symbol(c)? as u32
                } else if extra > 0 {
                    base + c.read_bits(extra)?
                } else {
                    1
                }
            }
        };
        self.r[2] = self.r[1];
        self.r[1] = self.r[0];
        self.r[0] = offset;
        Ok(offset)
    }

    fn copy_match(&mut self, offset: usize, length: usize) -> Result<()> {
        let size = self.window_size();
        if self.window_posn + length > size {
            return Err(corrupt("match runs past the end of the window"));
        }
        if offset > size {
            return Err(corrupt(format!("match offset {offset} exceeds the window")));
        }

        let mut dest = self.window_posn;
        let mut remaining = length;
        let mut src = if offset > dest {
            // Source starts in the wrapped-around tail of the window.
            let mut src = size - (offset - dest);
            let tail = (offset - dest).min(remaining);
            for _ in 0..tail {
                self.window[dest] = self.window[src];
                dest += 1;
                src += 1;
            }
            remaining -= tail;
            0
        } else {
            dest - offset
        };
        // Byte-at-a-time: source and destination may overlap.
        for _ in 0..remaining {
            self.window[dest] = self.window[src];
            dest += 1;
            src += 1;
        }
        self.window_posn = dest;
        Ok(())
    }

    /// Convert absolute E8 call targets back to relative ones.
    fn undo_e8(&mut self, data: &mut [u8]) {
        if self.intel_filesize == 0 {
            return;
        }
        let frame_size = data.len() as i32;
        if self.intel_started && self.frames_read < E8_MAX_FRAMES && data.len() > 10 {
            let filesize = self.intel_filesize;
            let mut curpos = self.intel_curpos;
            let mut i = 0;
            let end = data.len() - 10;
            while i < end {
                if data[i] != 0xE8 {
                    i += 1;
                    curpos = curpos.wrapping_add(1);
                    continue;
                }
                i += 1;
                let abs = i32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
                if abs >= curpos.wrapping_neg() && abs < filesize {
                    let rel = if abs >= 0 {
                        abs.wrapping_sub(curpos)
                    } else {
                        abs.wrapping_add(filesize)
                    };
                    data[i..i + 4].copy_from_slice(&rel.to_le_bytes());
                }
                i += 4;
                curpos = curpos.wrapping_add(5);
            }
        }
        self.intel_curpos = self.intel_curpos.wrapping_add(frame_size);
    }
}

/// `read_bits` for counts above 16 (large windows use up to 17 extra bits).
fn read_wide_bits(c: &mut ByteCursor, n: u32) -> Result<u32> {
    if n > 16 {
        let hi = c.read_bits(n - 16)?;
        let lo = c.read_bits(16)?;
        Ok((hi << 16) | lo)
    } else {
        c.read_bits(n)
    }
}
