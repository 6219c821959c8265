//! Fixed bit permutations of the S-DES block cipher.
//!
//! Each table is written in textbook form: entry `i` names the source bit
//! (1-based, counted from the most significant end of the input) that lands
//! in output position `i`. One [`Permutation::apply`] serves every table.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permutation<const N: usize> {
    input_bits: u32,
    table: [u8; N],
}

impl<const N: usize> Permutation<N> {
    pub const fn new(input_bits: u32, table: [u8; N]) -> Self {
        assert!(input_bits <= 16, "permutation input wider than 16 bits");
        let mut i = 0;
        while i < N {
            assert!(
                table[i] >= 1 && table[i] as u32 <= input_bits,
                "permutation source bit out of range"
            );
            i += 1;
        }
        Self { input_bits, table }
    }

    pub const fn input_bits(&self) -> u32 {
        self.input_bits
    }

    pub const fn output_bits(&self) -> u32 {
        N as u32
    }

    pub fn table(&self) -> &[u8; N] {
        &self.table
    }

    /// Permutes the low `input_bits` of `value`; higher bits are ignored.
    pub fn apply(&self, value: u16) -> u16 {
        self.table.iter().fold(0, |out, &source| {
            (out << 1) | ((value >> (self.input_bits - source as u32)) & 1)
        })
    }
}

/// Key schedule: reorders the 10-bit key.
pub const P10: Permutation<10> = Permutation::new(10, [3, 5, 2, 7, 4, 10, 1, 9, 8, 6]);
/// Key schedule: compresses the shifted 10-bit key to an 8-bit subkey.
pub const P8: Permutation<8> = Permutation::new(10, [6, 3, 7, 4, 8, 5, 10, 9]);
pub const IP: Permutation<8> = Permutation::new(8, [2, 6, 3, 1, 4, 8, 5, 7]);
pub const IP_INVERSE: Permutation<8> = Permutation::new(8, [4, 1, 3, 5, 7, 2, 8, 6]);
/// Round function expansion, high nibble (mixed with the subkey's high half).
pub const EP_HIGH: Permutation<4> = Permutation::new(4, [4, 1, 2, 3]);
/// Round function expansion, low nibble (mixed with the subkey's low half).
pub const EP_LOW: Permutation<4> = Permutation::new(4, [2, 3, 4, 1]);
/// Round function output permutation over the two S-box results.
pub const P4: Permutation<4> = Permutation::new(4, [2, 4, 3, 1]);
