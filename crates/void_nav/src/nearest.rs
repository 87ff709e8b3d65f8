//! Nearest-candidate lookup

use std::sync::Arc;

use crate::navigation::NavPoint;
use crate::target::{Actor, Target, WorldObject};

/// Anything that may have a position right now
pub trait Locate {
    fn locate(&self) -> Option<NavPoint>;
}

impl Locate for NavPoint {
    fn locate(&self) -> Option<NavPoint> {
        Some(*self)
    }
}

impl Locate for Target {
    fn locate(&self) -> Option<NavPoint> {
        self.current_position()
    }
}

impl Locate for dyn WorldObject {
    fn locate(&self) -> Option<NavPoint> {
        self.position()
    }
}

impl Locate for dyn Actor {
    fn locate(&self) -> Option<NavPoint> {
        self.position()
    }
}

impl<T: Locate + ?Sized> Locate for Arc<T> {
    fn locate(&self) -> Option<NavPoint> {
        (**self).locate()
    }
}

impl<T: Locate + ?Sized> Locate for &T {
    fn locate(&self) -> Option<NavPoint> {
        (**self).locate()
    }
}

/// Find the candidate closest to `position` by straight-line distance.
///
/// Candidates without a (finite) position are skipped, as are those the
/// predicate rejects. Ties go to the earlier candidate.
pub fn get_nearest<T, I>(
    position: &NavPoint,
    candidates: I,
    predicate: Option<&dyn Fn(&T) -> bool>,
) -> Option<T>
where
    T: Locate,
    I: IntoIterator<Item = T>,
{
    let mut best: Option<(T, f32)> = None;

    for candidate in candidates {
        if predicate.is_some_and(|keep| !keep(&candidate)) {
            continue;
        }
        let Some(point) = candidate.locate().filter(NavPoint::is_finite) else {
            continue;
        };

        let distance = position.distance_squared_to(&point);
        if best.as_ref().map_or(true, |(_, d)| distance < *d) {
            best = Some((candidate, distance));
        }
    }

    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named(&'static str, Option<NavPoint>);

    impl Locate for Named {
        fn locate(&self) -> Option<NavPoint> {
            self.1
        }
    }

    fn candidates() -> Vec<Named> {
        vec![
            Named("A", Some(NavPoint::new(0.0, 0.0, 0.0))),
            Named("B", Some(NavPoint::new(3.0, 0.0, 0.0))),
            Named("C", Some(NavPoint::new(1.0, 0.0, 0.0))),
        ]
    }

    #[test]
    fn test_nearest() {
        let list = candidates();
        let nearest = get_nearest(&NavPoint::ORIGIN, &list, None).unwrap();
        assert_eq!(nearest.0, "A");
    }

    #[test]
    fn test_nearest_with_predicate() {
        let not_a: &dyn Fn(&Named) -> bool = &|c| c.0 != "A";
        let nearest = get_nearest(&NavPoint::ORIGIN, candidates(), Some(not_a)).unwrap();
        assert_eq!(nearest.0, "C");
    }

    #[test]
    fn test_nearest_empty_and_filtered_out() {
        let empty: Vec<Named> = Vec::new();
        assert!(get_nearest(&NavPoint::ORIGIN, &empty, None).is_none());

        let reject_all: &dyn Fn(&Named) -> bool = &|_| false;
        assert!(get_nearest(&NavPoint::ORIGIN, candidates(), Some(reject_all)).is_none());
    }

    #[test]
    fn test_unlocatable_skipped() {
        let list = vec![
            Named("ghost", None),
            Named("nan", Some(NavPoint::new(f32::NAN, 0.0, 0.0))),
            Named("far", Some(NavPoint::new(50.0, 0.0, 0.0))),
        ];
        assert_eq!(get_nearest(&NavPoint::ORIGIN, &list, None).unwrap().0, "far");
    }

    #[test]
    fn test_ties_keep_first() {
        let list = vec![
            Named("first", Some(NavPoint::new(2.0, 0.0, 0.0))),
            Named("second", Some(NavPoint::new(-2.0, 0.0, 0.0))),
        ];
        assert_eq!(get_nearest(&NavPoint::ORIGIN, &list, None).unwrap().0, "first");
    }

    #[test]
    fn test_owned_points() {
        let points = vec![NavPoint::new(5.0, 0.0, 0.0), NavPoint::new(1.0, 1.0, 1.0)];
        let nearest = get_nearest(&NavPoint::ORIGIN, points, None).unwrap();
        assert_eq!(nearest, NavPoint::new(1.0, 1.0, 1.0));
    }
}
