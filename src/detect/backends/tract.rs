#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{resize, FilterType};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{non_max_suppression, BoundingBox, DetectedObject, Thresholds};

/// Default square input edge of YOLOv8 exports.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// Expects one output tensor shaped `[1, 4 + classes, anchors]` with boxes as
/// centre/size in input pixels followed by per-class scores.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    class_names: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32, class_names: Vec<String>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let edge = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, edge, edge)))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            class_names,
        })
    }

    fn build_input(&self, image: &RgbImage) -> Tensor {
        let edge = self.input_size as usize;
        let resized = resize(image, self.input_size, self.input_size, FilterType::Triangle);
        tract_ndarray::Array4::from_shape_fn((1, 3, edge, edge), |(_, channel, y, x)| {
            resized.get_pixel(x as u32, y as u32).0[channel] as f32 / 255.0
        })
        .into_tensor()
    }

    fn label_for(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }

    fn decode(
        &self,
        outputs: TVec<TValue>,
        image_width: u32,
        image_height: u32,
        thresholds: Thresholds,
    ) -> Result<Vec<DetectedObject>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("YOLO output must be three-dimensional")?;
        let shape = view.shape().to_vec();
        if shape[0] != 1 || shape[1] < 5 {
            return Err(anyhow!("unexpected YOLO output shape {:?}", shape));
        }
        let classes = shape[1] - 4;
        let anchors = shape[2];
        let sx = image_width as f32 / self.input_size as f32;
        let sy = image_height as f32 / self.input_size as f32;

        let mut candidates = Vec::new();
        for a in 0..anchors {
            let (class_id, score) = (0..classes)
                .map(|c| (c, view[[0, 4 + c, a]]))
                .fold((0, f32::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
            if !score.is_finite() || score < thresholds.confidence {
                continue;
            }
            let (cx, cy) = (view[[0, 0, a]], view[[0, 1, a]]);
            let (w, h) = (view[[0, 2, a]], view[[0, 3, a]]);
            let x1 = ((cx - w / 2.0) * sx).clamp(0.0, image_width as f32) as u32;
            let y1 = ((cy - h / 2.0) * sy).clamp(0.0, image_height as f32) as u32;
            let x2 = ((cx + w / 2.0) * sx).clamp(0.0, image_width as f32) as u32;
            let y2 = ((cy + h / 2.0) * sy).clamp(0.0, image_height as f32) as u32;
            let Ok(bbox) = BoundingBox::new(x1, y1, x2, y2) else {
                continue;
            };
            candidates.push(DetectedObject::new(self.label_for(class_id), score, bbox));
        }

        Ok(non_max_suppression(candidates, thresholds.iou))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, image: &RgbImage, thresholds: Thresholds) -> Result<Vec<DetectedObject>> {
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, image.width(), image.height(), thresholds)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = RgbImage::new(self.input_size, self.input_size);
        self.detect(&blank, Thresholds::default()).map(|_| ())
    }
}
