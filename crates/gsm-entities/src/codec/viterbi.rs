use gsm_core::{Sbit, Ubit};

use super::BitErrors;
use super::conv::ConvCode;

/// Type used to accumulate path metrics.
/// Received soft bits are at most 127 in magnitude and the longest trellis has
/// under 3000 mother code bits, so i32 never needs renormalization.
type Metric = i32;

/// One bit per state. Constraint lengths up to 7 give at most 64 states.
type DecisionBitmap = u64;

/// Viterbi decoder for a terminated rate 1/N code described by a `ConvCode`.
/// Handles both feed-forward and recursive systematic codes; punctured positions
/// are reinserted as erasures before decoding.
pub struct ViterbiDecoder {
    code: &'static ConvCode,
    /// For every state and both of its predecessors, the expected encoder output
    /// bits packed LSB first
    expected: Vec<[u32; 2]>,
    /// Encoder input that causes the transition from predecessor to state
    input: Vec<[Ubit; 2]>,
}

impl ViterbiDecoder {
    pub fn new(code: &'static ConvCode) -> Self {
        let num_states = code.num_states();
        let mut expected = vec![[0u32; 2]; num_states];
        let mut input = vec![[0u8; 2]; num_states];

        for state in 0..num_states {
            for t in 0..2 {
                let pred = predecessor(code, state, t);
                // The newest register bit of the state is the value that was shifted in
                let w = (state & 1) as Ubit;
                let u = w ^ code.tail_input(pred as u32);
                let (next, out) = code.transition(pred as u32, u);
                debug_assert_eq!(next as usize, state);
                expected[state][t] = out;
                input[state][t] = u;
            }
        }
        Self { code, expected, input }
    }

    /// Decodes `code.coded_len()` received soft bits into `code.len` hard bits.
    /// Returns the number of bit errors found by re-encoding the decision.
    pub fn decode(&self, received: &[Sbit], output: &mut [Ubit]) -> BitErrors {
        let code = self.code;
        assert!(received.len() >= code.coded_len(), "{}: input too short", code.name);
        assert!(output.len() >= code.len, "{}: output too short", code.name);

        let mother = self.depuncture(received);
        let num_states = code.num_states();
        let num_steps = code.len + code.k - 1;
        let mut trellis_decisions: Vec<DecisionBitmap> = Vec::with_capacity(num_steps);

        // Encoder starts from state 0. Others get a high initial value with room to accumulate
        let mut metrics: Vec<Metric> = vec![Metric::MAX / 2; num_states];
        metrics[0] = 0;
        let mut new_metrics: Vec<Metric> = vec![0; num_states];

        for step in mother.chunks_exact(code.n) {
            let mut decisions: DecisionBitmap = 0;
            for state in 0..num_states {
                let mut best = Metric::MAX;
                for t in 0..2 {
                    let pred = predecessor(code, state, t);
                    let candidate = metrics[pred] + branch_metric(step, self.expected[state][t]);
                    if candidate < best {
                        best = candidate;
                        if t == 1 {
                            decisions |= 1 << state;
                        }
                    }
                }
                new_metrics[state] = best;
            }
            std::mem::swap(&mut metrics, &mut new_metrics);
            trellis_decisions.push(decisions);
        }

        // Traceback. Tail bits ensure the final state of the encoder is 0.
        let mut state = 0usize;
        for (i, decisions) in trellis_decisions.iter().enumerate().rev() {
            let t = ((decisions >> state) & 1) as usize;
            if i < code.len {
                output[i] = self.input[state][t];
            }
            state = predecessor(code, state, t);
        }

        self.count_errors(&output[..code.len], received)
    }

    /// Expands the punctured bit stream to the mother code length, erasures at punctured positions
    fn depuncture(&self, received: &[Sbit]) -> Vec<Sbit> {
        let code = self.code;
        let mut mother = vec![0 as Sbit; code.mother_len()];
        let mut punct_idx = 0;
        let mut in_idx = 0;
        for (i, m) in mother.iter_mut().enumerate() {
            if punct_idx < code.puncture.len() && code.puncture[punct_idx] as usize == i {
                punct_idx += 1;
            } else {
                *m = received[in_idx];
                in_idx += 1;
            }
        }
        mother
    }

    fn count_errors(&self, decoded: &[Ubit], received: &[Sbit]) -> BitErrors {
        let code = self.code;
        let mut recoded = vec![0u8; code.coded_len()];
        code.encode(decoded, &mut recoded);

        let mut errors = BitErrors::default();
        for (r, s) in recoded.iter().zip(received) {
            if *s == 0 {
                continue;
            }
            errors.n_bits_total += 1;
            if (*r == 0 && *s < 0) || (*r != 0 && *s > 0) {
                errors.n_errors += 1;
            }
        }
        errors
    }
}

/// Predecessor `t` of `state`: the state shifted right, with `t` as the oldest register bit
#[inline(always)]
fn predecessor(code: &ConvCode, state: usize, t: usize) -> usize {
    (state >> 1) | (t << (code.k - 2))
}

/// Distance between received soft bits and expected output bits; lower is better
#[inline(always)]
fn branch_metric(received: &[Sbit], expected: u32) -> Metric {
    let mut m: Metric = 0;
    for (j, r) in received.iter().enumerate() {
        let r = *r as Metric;
        if (expected >> j) & 1 != 0 { m += r } else { m -= r }
    }
    m
}
