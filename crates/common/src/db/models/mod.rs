//! SeaORM entity models

mod analysis;

pub use analysis::{
    Entity as AnalysisEntity,
    Model as AnalysisRecord,
    ActiveModel as AnalysisActiveModel,
    Column as AnalysisColumn,
};
