/// How strictly a check treats the evidence it waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectationBehavior {
    /// Exactly `amount` matching entries are required. A poll timeout fails
    /// the check, except for `amount == 0`, where silence is the expected
    /// outcome and any observed entry fails the count.
    Expect { amount: usize },
    /// Any number of entries is tolerated, including none.
    Optional,
    /// History is polled but never inspected.
    Ignore,
}

impl Default for ExpectationBehavior {
    fn default() -> Self {
        ExpectationBehavior::Expect { amount: 1 }
    }
}

impl ExpectationBehavior {
    pub fn expect() -> Self {
        Self::default()
    }

    pub fn expect_amount(amount: usize) -> Self {
        ExpectationBehavior::Expect { amount }
    }

    /// The exact number of entries required, if any.
    pub fn expected_amount(&self) -> Option<usize> {
        match self {
            ExpectationBehavior::Expect { amount } => Some(*amount),
            ExpectationBehavior::Optional | ExpectationBehavior::Ignore => None,
        }
    }

    pub fn timeout_is_fatal(&self) -> bool {
        matches!(self, ExpectationBehavior::Expect { amount } if *amount > 0)
    }

    pub fn inspects_history(&self) -> bool {
        !matches!(self, ExpectationBehavior::Ignore)
    }
}
