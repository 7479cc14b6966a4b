//! Builds minimal synthetic ProTracker MOD byte buffers for tests. No
//! fixture files ship with this crate, so every test constructs the exact
//! bytes it needs through this builder.

pub const NAME_LEN: usize = 20;
pub const SAMPLE_HEADER_LEN: usize = 30;
pub const NUM_SAMPLE_SLOTS: usize = 32;
pub const ORDER_TABLE_LEN: usize = 128;
pub const PATTERN_LINES: usize = 64;
pub const NUM_CHANNELS: usize = 4;
pub const PATTERN_BYTES: usize = PATTERN_LINES * NUM_CHANNELS * 4;

/// Encode one 4-byte pattern cell the way a real MOD file packs it.
pub fn encode_note(period: u16, sample: u8, effect_type: u8, effect_param: u8) -> [u8; 4] {
    [
        (sample & 0xF0) | (((period >> 8) as u8) & 0x0F),
        (period & 0xFF) as u8,
        ((sample & 0x0F) << 4) | (effect_type & 0x0F),
        effect_param,
    ]
}

/// A sample header plus its raw signed-8-bit PCM payload.
#[derive(Clone)]
pub struct SampleSpec {
    pub name: &'static str,
    pub fine_tune: u8,
    pub volume: u8,
    pub repeat_offset_words: u16,
    pub repeat_length_words: u16,
    pub pcm: Vec<i8>,
}

impl SampleSpec {
    pub fn silent() -> Self {
        SampleSpec {
            name: "",
            fine_tune: 0,
            volume: 0,
            repeat_offset_words: 0,
            repeat_length_words: 0,
            pcm: Vec::new(),
        }
    }

    pub fn tone(volume: u8, pcm: Vec<i8>) -> Self {
        SampleSpec {
            name: "tone",
            fine_tune: 0,
            volume,
            repeat_offset_words: 0,
            repeat_length_words: 0,
            pcm,
        }
    }

    pub fn looped(volume: u8, pcm: Vec<i8>, repeat_offset_words: u16, repeat_length_words: u16) -> Self {
        SampleSpec {
            name: "loop",
            fine_tune: 0,
            volume,
            repeat_offset_words,
            repeat_length_words,
            pcm,
        }
    }

    fn length_words(&self) -> u16 {
        (self.pcm.len() / 2) as u16
    }
}

/// Assembles a full MOD byte buffer from a song name, up to 31 sample
/// specs, a pattern order, and raw pattern line data.
pub struct ModBuilder {
    pub name: &'static str,
    pub samples: Vec<SampleSpec>,
    pub order: Vec<u8>,
    pub patterns: Vec<[[[u8; 4]; NUM_CHANNELS]; PATTERN_LINES]>,
}

impl ModBuilder {
    pub fn new() -> Self {
        ModBuilder {
            name: "test song",
            samples: Vec::new(),
            order: vec![0],
            patterns: vec![[[[0u8; 4]; NUM_CHANNELS]; PATTERN_LINES]],
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        let mut name_bytes = [0u8; NAME_LEN];
        for (dst, src) in name_bytes.iter_mut().zip(self.name.as_bytes()) {
            *dst = *src;
        }
        buf.extend_from_slice(&name_bytes);

        for slot in 0..(NUM_SAMPLE_SLOTS - 1) {
            let empty = SampleSpec::silent();
            let spec = self.samples.get(slot).unwrap_or(&empty);

            let mut header = [0u8; SAMPLE_HEADER_LEN];
            for (dst, src) in header[0..22].iter_mut().zip(spec.name.as_bytes()) {
                *dst = *src;
            }
            header[22..24].copy_from_slice(&spec.length_words().to_be_bytes());
            header[24] = spec.fine_tune & 0x0F;
            header[25] = spec.volume;
            header[26..28].copy_from_slice(&spec.repeat_offset_words.to_be_bytes());
            header[28..30].copy_from_slice(&spec.repeat_length_words.to_be_bytes());
            buf.extend_from_slice(&header);
        }

        buf.push(self.order.len() as u8); // song length
        buf.push(127); // restart byte, ignored by the loader

        let mut order_table = [0u8; ORDER_TABLE_LEN];
        for (dst, src) in order_table.iter_mut().zip(self.order.iter()) {
            *dst = *src;
        }
        buf.extend_from_slice(&order_table);

        buf.extend_from_slice(b"M.K."); // signature, unvalidated

        for pattern in &self.patterns {
            for line in pattern.iter() {
                for cell in line.iter() {
                    buf.extend_from_slice(cell);
                }
            }
        }

        for slot in 0..(NUM_SAMPLE_SLOTS - 1) {
            let empty = SampleSpec::silent();
            let spec = self.samples.get(slot).unwrap_or(&empty);
            for &byte in &spec.pcm {
                buf.push(byte as u8);
            }
        }

        buf
    }
}
