// ── Device storage ──
//
// Keyed, ordered, reactive storage for the hub's device set.

mod collection;

pub(crate) use collection::KeyedCollection;
