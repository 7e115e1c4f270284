//! ZShape 核心几何引擎
//!
//! 提供2D整数坐标下的碰撞图元、碰撞检测和距离查询。
//!
//! # 架构设计
//!
//! - `Shape`: 封闭的图元枚举（矩形、圆、线段、折线、多边形、圆弧、组合）
//! - `PairCollide`: 每一对图元类型一个碰撞例程，反向组合自动取反 MTV
//! - 坐标使用 `i32`，平方距离等中间结果使用 `i64`
//!
//! # 示例
//!
//! ```rust
//! use zshape_core::prelude::*;
//!
//! let a = Shape::from(Circle::new(Point2I::new(0, 0), 5));
//! let b = Shape::from(Circle::new(Point2I::new(8, 0), 5));
//!
//! assert!(a.collide(&b, 0));
//! let mtv = a.collide_mtv(&b, 0).unwrap();
//! println!("MTV: {:?}", mtv);
//! ```

pub mod collision;
pub mod error;
pub mod geometry;
pub mod line_chain;
pub mod math;
pub mod seg;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::collision::{
        collide_any_of, collide_shapes, find_colliding, Collision, Contact, PairCollide, Request,
    };
    pub use crate::error::ShapeError;
    pub use crate::geometry::{Arc, Circle, Compound, Rect, Segment, Shape, ShapeType};
    pub use crate::line_chain::{Intersection, LineChain, LineChainBase, SimplePolygon};
    pub use crate::math::{BoundingBox2I, Coord, ECoord, Point2I, Vector2I, VectorExt};
    pub use crate::seg::Seg;
}
