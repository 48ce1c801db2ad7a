use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{OptionLayout, Prompt, SLOT_COUNT};

/// Hands out a session's prompts one at a time in shuffled order.
///
/// Exhaustion is the normal end of a session, not an error.
#[derive(Debug, Clone, Default)]
pub struct QuestionSequencer {
    prompts: Vec<Prompt>,
    order: Vec<usize>,
    cursor: usize,
}

impl QuestionSequencer {
    /// Load prompts in their given order. Call [`initialize_shuffle`](Self::initialize_shuffle)
    /// before drawing to randomize.
    #[must_use]
    pub fn new(prompts: Vec<Prompt>) -> Self {
        let order = (0..prompts.len()).collect();
        Self {
            prompts,
            order,
            cursor: 0,
        }
    }

    /// Replace the loaded prompts and rewind.
    pub fn load(&mut self, prompts: Vec<Prompt>) {
        *self = Self::new(prompts);
    }

    /// Reshuffle every loaded prompt and rewind the cursor.
    pub fn initialize_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order = (0..self.prompts.len()).collect();
        self.order.shuffle(rng);
        self.cursor = 0;
    }

    /// The next prompt, or `None` once every prompt has been drawn.
    pub fn next_prompt(&mut self) -> Option<&Prompt> {
        let index = *self.order.get(self.cursor)?;
        self.cursor += 1;
        self.prompts.get(index)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.order.len().saturating_sub(self.cursor)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Shuffle a prompt's three options into display slots.
pub fn arrange_options<R: Rng + ?Sized>(prompt: &Prompt, rng: &mut R) -> OptionLayout {
    let mut order: [usize; SLOT_COUNT] = [0, 1, 2];
    order.shuffle(rng);
    OptionLayout::arrange(prompt, order).unwrap_or_else(|_| OptionLayout::canonical(prompt))
}
