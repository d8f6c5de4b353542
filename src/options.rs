//! Table configuration options.

/// Configuration for a blackjack table.
///
/// Use the builder pattern to customize options:
///
/// ```
/// use bjtable::TableOptions;
///
/// let options = TableOptions::default()
///     .with_num_seats(6)
///     .with_decks(8)
///     .with_buy_in(500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Number of seats at the table.
    pub num_seats: u8,
    /// Number of decks in the shoe (clamped to 6..=8 at construction).
    pub decks: u8,
    /// Chips a new seat starts with.
    pub buy_in: i64,
    /// Wager denominations the table accepts. `0` skips the round.
    pub available_bets: Vec<i64>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            num_seats: 4,
            decks: 6,
            buy_in: 1000,
            available_bets: vec![0, 1, 2, 5, 25, 100, 500],
        }
    }
}

impl TableOptions {
    /// Sets the number of seats.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_num_seats(6);
    /// assert_eq!(options.num_seats, 6);
    /// ```
    #[must_use]
    pub const fn with_num_seats(mut self, num_seats: u8) -> Self {
        self.num_seats = num_seats;
        self
    }

    /// Sets the number of decks.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_decks(8);
    /// assert_eq!(options.decks, 8);
    /// ```
    #[must_use]
    pub const fn with_decks(mut self, decks: u8) -> Self {
        self.decks = decks;
        self
    }

    /// Sets the starting balance for new seats.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_buy_in(500);
    /// assert_eq!(options.buy_in, 500);
    /// ```
    #[must_use]
    pub const fn with_buy_in(mut self, buy_in: i64) -> Self {
        self.buy_in = buy_in;
        self
    }

    /// Sets the accepted wager denominations.
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::TableOptions;
    ///
    /// let options = TableOptions::default().with_available_bets(vec![0, 10, 50]);
    /// assert_eq!(options.available_bets, vec![0, 10, 50]);
    /// ```
    #[must_use]
    pub fn with_available_bets(mut self, bets: Vec<i64>) -> Self {
        self.available_bets = bets;
        self
    }
}
