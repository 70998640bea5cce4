use crate::{
  disposable::Disposable,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

/// Emits every item of `iter` in order, then completes.
///
/// Emission is synchronous inside `subscribe`, and stops as soon as the
/// observer reports closed, so infinite iterators compose with operators
/// that cut the subscription short.
pub fn from_iter<Item, I>(iter: I) -> Observable<Item>
where
  Item: Send + 'static,
  I: IntoIterator<Item = Item> + Clone + Send + Sync + 'static,
{
  Observable::new(move |mut observer: BoxedObserver<Item>, _| {
    for value in iter.clone() {
      if observer.is_closed() {
        return Disposable::empty();
      }
      observer.on_next(value);
    }
    observer.on_completed();
    Disposable::empty()
  })
}

#[cfg(test)]
mod test {
  use std::sync::{Arc, Mutex};

  use super::*;

  #[test]
  fn emits_in_order_then_completes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (values, completions) = (log.clone(), log.clone());
    from_iter(1..=3).subscribe_all(
      move |v| values.lock().unwrap().push(format!("next {v}")),
      |_| {},
      move || completions.lock().unwrap().push("complete".into()),
    );
    assert_eq!(
      *log.lock().unwrap(),
      vec!["next 1", "next 2", "next 3", "complete"]
    );
  }

  #[test]
  fn resubscribing_replays_from_the_start() {
    let source = from_iter(vec![7, 8]);
    for _ in 0..2 {
      let got = Arc::new(Mutex::new(Vec::new()));
      let g = got.clone();
      source.subscribe(move |v| g.lock().unwrap().push(v));
      assert_eq!(*got.lock().unwrap(), vec![7, 8]);
    }
  }
}
