//! Feature preprocessing: scaling, one-hot encoding, TF-IDF text features,
//! and the pipeline that stitches them into one matrix.

pub mod encoder;
pub mod pipeline;
pub mod scaler;
pub mod text;

pub use encoder::OneHotEncoder;
pub use pipeline::{FeaturePipeline, PipelineConfig};
pub use scaler::{Scaler, ScalerType};
pub use text::{CountVectorizer, TextTokenizer, TfidfVectorizer};
