/// Initial key of the table-of-contents transform.
pub const TOC_SEED: u8 = 0xAC;
/// Amount added to the key after every table byte.
pub const TOC_KEY_STEP: u8 = 0x67;
/// Constant XOR applied to main-archive payload bytes.
pub const PAYLOAD_XOR: u8 = 0x35;

/// Rolling-key state for table-of-contents bytes.
///
/// The key advances once per byte regardless of field boundaries, so one state must be
/// threaded through the whole table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TocKey {
    key: u8,
}

impl TocKey {
    pub fn new(seed: u8) -> Self {
        Self { key: seed }
    }

    pub fn key(&self) -> u8 {
        self.key
    }

    /// Decode one stored byte: rotate left by two, then add the key.
    pub fn decode_byte(&mut self, stored: u8) -> u8 {
        let plain = stored.rotate_left(2).wrapping_add(self.key);
        self.key = self.key.wrapping_add(TOC_KEY_STEP);
        plain
    }

    /// Inverse of [`TocKey::decode_byte`].
    pub fn encode_byte(&mut self, plain: u8) -> u8 {
        let stored = plain.wrapping_sub(self.key).rotate_right(2);
        self.key = self.key.wrapping_add(TOC_KEY_STEP);
        stored
    }
}

impl Default for TocKey {
    fn default() -> Self {
        Self::new(TOC_SEED)
    }
}

pub fn toc_decode(data: &[u8], seed: u8) -> Vec<u8> {
    let mut state = TocKey::new(seed);
    data.iter().map(|&b| state.decode_byte(b)).collect()
}

pub fn toc_encode(data: &[u8], seed: u8) -> Vec<u8> {
    let mut state = TocKey::new(seed);
    data.iter().map(|&b| state.encode_byte(b)).collect()
}

/// Apply the payload XOR in place. Self-inverse.
pub fn xor_payload(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte ^= PAYLOAD_XOR;
    }
}
