// Seeded synthetic row source.
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::core::datum::Datum;
use crate::core::row::{Row, RowLayout};

pub struct RowGenerator {
    layout: RowLayout,
    rng: Pcg64,
}

impl RowGenerator {
    pub fn new(layout: RowLayout, seed: u64) -> Self {
        Self {
            layout,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    /// Every field and the handle are drawn from `0..=i64::MAX`.
    pub fn next_row(&mut self) -> Row {
        let key = (0..self.layout.key_size)
            .map(|_| Datum::Int(self.rng.gen_range(0..=i64::MAX)))
            .collect();
        let val = (0..self.layout.val_size)
            .map(|_| Datum::Int(self.rng.gen_range(0..=i64::MAX)))
            .collect();
        let handle = self.rng.gen_range(0..=i64::MAX);
        Row { key, val, handle }
    }

    pub fn rows(&mut self, scale: usize) -> impl Iterator<Item = Row> + '_ {
        (0..scale).map(move |_| self.next_row())
    }
}

#[cfg(test)]
mod tests {
    use super::RowGenerator;
    use crate::core::row::RowLayout;

    #[test]
    fn rows_follow_layout() {
        let layout = RowLayout::new(3, 2).expect("layout");
        let mut generator = RowGenerator::new(layout, 7);
        let rows: Vec<_> = generator.rows(50).collect();
        assert_eq!(rows.len(), 50);
        for row in &rows {
            assert!(row.layout_matches(layout));
            assert!(row.handle >= 0);
            for field in row.key.iter().chain(row.val.iter()) {
                assert!(field.as_int().expect("int field") >= 0);
            }
        }
    }

    #[test]
    fn same_seed_same_rows() {
        let layout = RowLayout::new(2, 2).expect("layout");
        let a: Vec<_> = RowGenerator::new(layout, 99).rows(10).collect();
        let b: Vec<_> = RowGenerator::new(layout, 99).rows(10).collect();
        let c: Vec<_> = RowGenerator::new(layout, 100).rows(10).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
