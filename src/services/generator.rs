use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A synthetic user that has not been persisted yet. The store assigns ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub gender: &'static str,
    pub has_problems: bool,
}

/// Generates synthetic users from a record index and an explicit random
/// source. Names and gender derive deterministically from the index; age and
/// the problems flag come from the rng, so a fixed seed reproduces the whole
/// sequence.
pub struct UserGenerator {
    rng: StdRng,
    next_index: i64,
}

impl UserGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_index: 0,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            next_index: 0,
        }
    }

    /// Continue generating from a later index (incremental population).
    pub fn with_start_index(mut self, index: i64) -> Self {
        self.next_index = index;
        self
    }

    pub fn current_index(&self) -> i64 {
        self.next_index
    }

    pub fn next_user(&mut self) -> NewUser {
        let i = self.next_index;
        self.next_index += 1;

        NewUser {
            first_name: format!("FirstName{}", i),
            last_name: format!("LastName{}", i),
            age: self.rng.gen_range(0..100),
            gender: if i % 2 == 0 { "Male" } else { "Female" },
            has_problems: self.rng.gen_bool(0.5),
        }
    }

    pub fn next_batch(&mut self, count: usize) -> Vec<NewUser> {
        (0..count).map(|_| self.next_user()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_reproduces_the_sequence() {
        let mut a = UserGenerator::new(42);
        let mut b = UserGenerator::new(42);
        assert_eq!(a.next_batch(100), b.next_batch(100));
    }

    #[test]
    fn names_and_gender_follow_the_index() {
        let mut gen = UserGenerator::new(7);
        let users = gen.next_batch(10);

        for (i, user) in users.iter().enumerate() {
            assert_eq!(user.first_name, format!("FirstName{}", i));
            assert_eq!(user.last_name, format!("LastName{}", i));
            let expected = if i % 2 == 0 { "Male" } else { "Female" };
            assert_eq!(user.gender, expected);
        }
    }

    #[test]
    fn start_index_carries_into_names_and_gender() {
        let mut gen = UserGenerator::new(7).with_start_index(5);
        let user = gen.next_user();
        assert_eq!(user.first_name, "FirstName5");
        assert_eq!(user.gender, "Female");
        assert_eq!(gen.current_index(), 6);
    }

    #[test]
    fn ages_stay_in_range() {
        let mut gen = UserGenerator::new(1);
        assert!(gen
            .next_batch(1_000)
            .iter()
            .all(|u| (0..=99).contains(&u.age)));
    }

    #[test]
    fn problems_flag_takes_both_values() {
        let mut gen = UserGenerator::new(3);
        let users = gen.next_batch(1_000);
        assert!(users.iter().any(|u| u.has_problems));
        assert!(users.iter().any(|u| !u.has_problems));
    }
}
