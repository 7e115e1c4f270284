//! ZShape 交互编辑
//!
//! 逐点构建多边形：锁定顶点、跟随光标的引导线、45°捕捉以及自相交检查。

pub mod error;
pub mod polygon_geom;

pub use error::AddPointError;
pub use polygon_geom::{
    LeaderMode, PolygonGeom, PolygonGeomClient, PolygonGeomConfig, PolygonGeomManager,
    PolygonGeomState,
};
