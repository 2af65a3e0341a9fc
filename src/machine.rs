/// Mutable state of one run: the tape, the data pointer and the input.
///
/// The tape has a fixed length chosen by the caller and starts zeroed.
/// Input, when present, is an immutable byte buffer read through a cursor
/// that never moves past its last byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    tape: Vec<u8>,
    pointer: usize,
    input: Option<Vec<u8>>,
    input_cursor: usize,
}

impl Machine {
    /// Create a machine with `tape_size` zeroed cells.
    ///
    /// A size of 0 is accepted, but every pointer move on such a tape faults
    /// and touching the cell panics; callers are expected to pass a positive
    /// size.
    pub fn new(tape_size: usize, input: Option<Vec<u8>>) -> Self {
        Self {
            tape: vec![0; tape_size],
            pointer: 0,
            input,
            input_cursor: 0,
        }
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Value of the cell under the pointer.
    pub fn cell(&self) -> u8 {
        self.tape[self.pointer]
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn tape_len(&self) -> usize {
        self.tape.len()
    }

    pub fn input(&self) -> Option<&[u8]> {
        self.input.as_deref()
    }

    pub fn input_cursor(&self) -> usize {
        self.input_cursor
    }

    /// Zero the tape and rewind pointer and input cursor. Input is kept.
    pub fn reset(&mut self) {
        self.tape.fill(0);
        self.pointer = 0;
        self.input_cursor = 0;
    }

    pub(crate) fn cell_mut(&mut self) -> &mut u8 {
        &mut self.tape[self.pointer]
    }

    pub(crate) fn set_pointer(&mut self, pointer: usize) {
        self.pointer = pointer;
    }

    /// Read the byte under the input cursor, if input is configured.
    ///
    /// The cursor only advances while another byte follows, so once input
    /// is exhausted every read returns the final byte again. A configured
    /// but empty input reads as 0.
    pub(crate) fn read_input(&mut self) -> Option<u8> {
        let input = self.input.as_ref()?;
        let byte = input.get(self.input_cursor).copied().unwrap_or(0);
        if self.input_cursor + 1 < input.len() {
            self.input_cursor += 1;
        }
        Some(byte)
    }
}
