//! Waiter cart
//!
//! In-memory list of order lines built up on the intake screen. Lines are
//! addressed by index; an index that does not exist makes the operation a
//! no-op that reports `false`. A change that would push the total out of
//! `Decimal` range is refused and leaves the cart as it was.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AmountOverflow, MenuItem, OrderItem, checked_sum};

/// A cart line has the same shape as an order's embedded item
pub type CartLine = OrderItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `item`
    ///
    /// Merges into an existing line only when that line has the same item id
    /// and no note; otherwise appends a new line with quantity 1.
    pub fn add(&mut self, item: &MenuItem) -> Result<(), AmountOverflow> {
        let mut lines = self.lines.clone();
        match lines
            .iter()
            .position(|l| l.id == item.id && l.note.is_empty())
        {
            Some(index) => lines[index].quantity = lines[index].quantity.saturating_add(1),
            None => lines.push(CartLine {
                id: item.id.clone(),
                name: item.name.clone(),
                quantity: 1,
                price: item.price,
                note: String::new(),
            }),
        }
        self.replace_lines(lines)
    }

    pub fn increment(&mut self, index: usize) -> Result<bool, AmountOverflow> {
        let mut lines = self.lines.clone();
        let Some(line) = lines.get_mut(index) else {
            return Ok(false);
        };
        line.quantity = line.quantity.saturating_add(1);
        self.replace_lines(lines)?;
        Ok(true)
    }

    /// Decrement; a line reaching zero is removed
    pub fn decrement(&mut self, index: usize) -> bool {
        let Some(line) = self.lines.get_mut(index) else {
            return false;
        };
        line.quantity -= 1;
        if line.quantity <= 0 {
            self.lines.remove(index);
        }
        true
    }

    fn replace_lines(&mut self, lines: Vec<CartLine>) -> Result<(), AmountOverflow> {
        Self::sum(&lines)?;
        self.lines = lines;
        Ok(())
    }

    fn sum(lines: &[CartLine]) -> Result<Decimal, AmountOverflow> {
        checked_sum(lines.iter().map(OrderItem::subtotal))
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.lines.len() {
            return false;
        }
        self.lines.remove(index);
        true
    }

    /// Replace the free-text note of a line
    pub fn set_note(&mut self, index: usize, note: impl Into<String>) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                line.note = note.into();
                true
            }
            None => false,
        }
    }

    /// Σ price × quantity, recomputed on every call
    pub fn total(&self) -> Result<Decimal, AmountOverflow> {
        Self::sum(&self.lines)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Copy of the lines, embedded into the order on submission
    pub fn snapshot(&self) -> Vec<OrderItem> {
        self.lines.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn menu_item(id: i64, price: &str) -> MenuItem {
        MenuItem {
            id: RecordId::from(id),
            name: format!("Plato {id}"),
            description: String::new(),
            price: dec(price),
            category_id: Some(RecordId::from(1)),
            available: true,
        }
    }

    fn assert_consistent(cart: &Cart) {
        let expected: Decimal = cart
            .lines()
            .iter()
            .map(|l| l.price * Decimal::from(l.quantity))
            .sum();
        assert_eq!(cart.total(), Ok(expected));
        assert!(cart.lines().iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn test_same_item_three_times_merges() {
        let mut cart = Cart::new();
        let taco = menu_item(1, "4.50");
        for _ in 0..3 {
            cart.add(&taco).unwrap();
        }
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.lines()[0].subtotal(), Ok(dec("13.50")));
        assert_eq!(cart.total(), Ok(dec("13.50")));
    }

    #[test]
    fn test_noted_line_is_not_merged() {
        let mut cart = Cart::new();
        let taco = menu_item(1, "4.50");
        cart.add(&taco).unwrap();
        assert!(cart.set_note(0, "sin cebolla"));
        cart.add(&taco).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].note, "sin cebolla");
        assert_eq!(cart.lines()[1].quantity, 1);

        // further adds go to the plain line
        cart.add(&taco).unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[1].quantity, 2);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(&menu_item(1, "2.00")).unwrap();
        cart.add(&menu_item(2, "3.00")).unwrap();
        assert!(cart.decrement(0));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].id, RecordId::from(2));
        assert_eq!(cart.total(), Ok(dec("3.00")));
    }

    #[test]
    fn test_out_of_range_index_is_noop() {
        let mut cart = Cart::new();
        cart.add(&menu_item(1, "2.00")).unwrap();
        let before = cart.clone();
        assert_eq!(cart.increment(5), Ok(false));
        assert!(!cart.decrement(1));
        assert!(!cart.remove(1));
        assert!(!cart.set_note(3, "x"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_operation_sequence_keeps_total_consistent() {
        let items = [
            menu_item(1, "4.50"),
            menu_item(2, "1.25"),
            menu_item(3, "10.00"),
        ];
        let mut cart = Cart::new();
        // deterministic pseudo-random walk over the operations
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let pick = (seed >> 16) as usize;
            let index = pick % (cart.len() + 1);
            match pick % 5 {
                0 | 1 => cart.add(&items[pick % items.len()]).unwrap(),
                2 => {
                    cart.increment(index).unwrap();
                }
                3 => {
                    cart.decrement(index);
                }
                _ => {
                    if pick % 7 == 0 {
                        cart.set_note(index, "extra");
                    } else {
                        cart.remove(index);
                    }
                }
            }
            assert_consistent(&cart);
        }
    }

    #[test]
    fn test_out_of_range_total_is_refused() {
        let mut cart = Cart::new();
        let mut huge = menu_item(1, "1");
        huge.price = Decimal::from_scientific("5e28").unwrap();

        cart.add(&huge).unwrap();
        assert_eq!(cart.add(&huge), Err(AmountOverflow));
        assert_eq!(cart.increment(0), Err(AmountOverflow));
        cart.add(&menu_item(2, "1.00")).unwrap();

        assert_eq!(cart.lines()[0].quantity, 1);
        assert_eq!(cart.len(), 2);
        assert!(cart.total().is_ok());
        assert!(cart.decrement(0));
        assert_eq!(cart.total(), Ok(dec("1.00")));
    }

    #[test]
    fn test_clear_and_snapshot() {
        let mut cart = Cart::new();
        cart.add(&menu_item(1, "4.50")).unwrap();
        cart.add(&menu_item(1, "4.50")).unwrap();
        let snapshot = cart.snapshot();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Ok(Decimal::ZERO));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 2);
    }
}
