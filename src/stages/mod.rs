pub mod stage0_plan;
pub mod stage1_oracle;
pub mod stage2_realign;
pub mod stage3_render;

pub use stage0_plan::*;
pub use stage1_oracle::*;
pub use stage2_realign::*;
pub use stage3_render::*;
