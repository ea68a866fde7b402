pub mod comment;
pub mod group;
pub mod post;
pub mod user;

/// Looks up the count belonging to `id` in a list of `(id, count)` pairs returned by a
/// grouped count query. Ids without rows have a count of zero.
fn count_for(counts: &[(i64, i64)], id: i64) -> i64 {
    counts
        .iter()
        .find(|&&(counted_id, _)| counted_id == id)
        .map_or(0, |&(_, count)| count)
}

#[cfg(test)]
mod test {
    #[test]
    fn count_for() {
        let counts = [(1, 4), (3, 2)];
        assert_eq!(super::count_for(&counts, 1), 4);
        assert_eq!(super::count_for(&counts, 3), 2);
        assert_eq!(super::count_for(&counts, 2), 0);
    }
}
