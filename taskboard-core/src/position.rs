/// Position Store primitives shared by the reorder and move engines.
///
/// A scope is any set of siblings that share one ordering (the lists of a
/// board, the cards of a list, or all boards). Positions are plain integers;
/// gaps are tolerated when reading, and every reorder/move renormalizes the
/// scopes it touches to `0..n-1`.

/// An entity with an identity and a rank inside its scope.
pub trait Positioned {
    fn id(&self) -> &str;
    fn position(&self) -> i64;
    fn set_position(&mut self, position: i64);
}

/// Collect a scope sorted by position ascending. The sort is stable, so
/// entities sharing a position keep their storage order.
pub fn sorted_by_position<'a, T, I>(items: I) -> Vec<&'a T>
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut sorted: Vec<&T> = items.into_iter().collect();
    sorted.sort_by_key(|item| item.position());
    sorted
}

/// Position for a newly created entity: 0 for an empty scope, otherwise
/// `max + 1`. Uses max rather than count so gaps never cause a collision.
pub fn next_position<'a, T, I>(items: I) -> i64
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.position())
        .max()
        .map_or(0, |max| max + 1)
}

/// Assign `0..n-1` in slice order.
pub fn renumber<T: Positioned>(items: &mut [&mut T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_position(index as i64);
    }
}

/// Clamp a requested insertion index into `[0, len]`.
pub fn clamp_index(index: i64, len: usize) -> usize {
    if index <= 0 {
        0
    } else {
        usize::try_from(index).map_or(len, |i| i.min(len))
    }
}

/// True when the scope's positions are exactly `0..n-1` in sorted order.
pub fn is_dense<'a, T, I>(items: I) -> bool
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    sorted_by_position(items)
        .iter()
        .enumerate()
        .all(|(index, item)| item.position() == index as i64)
}
