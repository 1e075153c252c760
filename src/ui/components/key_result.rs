/// Outcome of offering a key to a component.
///
/// Views try their active components first and fall through to their own
/// bindings on `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the parent to do
  Handled,
  /// Key was consumed and produced an event for the parent
  Event(T),
  /// Key was not consumed
  NotHandled,
}
