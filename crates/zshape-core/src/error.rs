//! 图元构造错误定义

use crate::math::Coord;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Negative radius: {0}")]
    NegativeRadius(Coord),

    #[error("Negative rectangle size: {0} x {1}")]
    NegativeSize(Coord, Coord),

    #[error("Negative segment width: {0}")]
    NegativeWidth(Coord),

    #[error("Arc points are collinear")]
    CollinearArcPoints,

    #[error("Arc points are coincident")]
    CoincidentArcPoints,
}
