//! Fixed catalog of the supported segmentation models.
//!
//! Identifiers, input sizes, normalization constants, and output heads match
//! the published weights each entry downloads: the u2net family and silueta
//! run at 320×320, u2net_cloth_seg at 768×768, and the isnet / birefnet /
//! bria models at 1024×1024.

/// Release bucket the pretrained weights are fetched from.
pub const WEIGHT_BASE_URL: &str = "https://github.com/danielgatis/rembg/releases/download/v0.0.0";

/// ImageNet normalization constants
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

const UNIT_STD: [f32; 3] = [1.0, 1.0, 1.0];

/// How the raw model output becomes an alpha matte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputHead {
    /// Single-channel saliency map, min-max rescaled to 0..255.
    /// `sigmoid` squashes raw logits first (birefnet emits logits).
    Saliency { sigmoid: bool },
    /// Four-class garment map; channel argmax yields one binary mask per
    /// clothing class (upper, lower, full body).
    Garment,
}

/// Per-model inference constants.
#[derive(Clone, Copy, Debug)]
pub struct ModelSpec {
    /// Square input edge the model expects.
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub head: OutputHead,
    /// File name inside the models directory.
    pub weight_file: &'static str,
}

/// The selectable models, in the order the picker presents them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    U2net,
    U2netp,
    U2netHumanSeg,
    U2netClothSeg,
    Silueta,
    IsnetGeneralUse,
    IsnetAnime,
    BirefnetGeneral,
    BirefnetGeneralLite,
    BirefnetPortrait,
    BirefnetDis,
    BirefnetHrsod,
    BirefnetCod,
    BirefnetMassive,
    BriaRmbg,
}

impl Default for ModelKind {
    fn default() -> Self {
        ModelKind::U2net
    }
}

impl ModelKind {
    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::U2net,
            ModelKind::U2netp,
            ModelKind::U2netHumanSeg,
            ModelKind::U2netClothSeg,
            ModelKind::Silueta,
            ModelKind::IsnetGeneralUse,
            ModelKind::IsnetAnime,
            ModelKind::BirefnetGeneral,
            ModelKind::BirefnetGeneralLite,
            ModelKind::BirefnetPortrait,
            ModelKind::BirefnetDis,
            ModelKind::BirefnetHrsod,
            ModelKind::BirefnetCod,
            ModelKind::BirefnetMassive,
            ModelKind::BriaRmbg,
        ]
    }

    /// Canonical identifier, as shown in the model picker.
    pub fn identifier(&self) -> &'static str {
        match self {
            ModelKind::U2net => "u2net",
            ModelKind::U2netp => "u2netp",
            ModelKind::U2netHumanSeg => "u2net_human_seg",
            ModelKind::U2netClothSeg => "u2net_cloth_seg",
            ModelKind::Silueta => "silueta",
            ModelKind::IsnetGeneralUse => "isnet-general-use",
            ModelKind::IsnetAnime => "isnet-anime",
            ModelKind::BirefnetGeneral => "birefnet-general",
            ModelKind::BirefnetGeneralLite => "birefnet-general-lite",
            ModelKind::BirefnetPortrait => "birefnet-portrait",
            ModelKind::BirefnetDis => "birefnet-dis",
            ModelKind::BirefnetHrsod => "birefnet-HRSOD",
            ModelKind::BirefnetCod => "birefnet-cod",
            ModelKind::BirefnetMassive => "birefnet-massive",
            ModelKind::BriaRmbg => "bria-rmbg",
        }
    }

    pub fn spec(&self) -> ModelSpec {
        match self {
            ModelKind::U2net => ModelSpec {
                input_size: 320,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "u2net.onnx",
            },
            ModelKind::U2netp => ModelSpec {
                input_size: 320,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "u2netp.onnx",
            },
            ModelKind::U2netHumanSeg => ModelSpec {
                input_size: 320,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "u2net_human_seg.onnx",
            },
            ModelKind::U2netClothSeg => ModelSpec {
                input_size: 768,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Garment,
                weight_file: "u2net_cloth_seg.onnx",
            },
            ModelKind::Silueta => ModelSpec {
                input_size: 320,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "silueta.onnx",
            },
            ModelKind::IsnetGeneralUse => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: UNIT_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "isnet-general-use.onnx",
            },
            ModelKind::IsnetAnime => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: UNIT_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "isnet-anime.onnx",
            },
            ModelKind::BirefnetGeneral => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-general-epoch_244.onnx",
            },
            ModelKind::BirefnetGeneralLite => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-general-bb_swin_v1_tiny-epoch_232.onnx",
            },
            ModelKind::BirefnetPortrait => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-portrait-epoch_150.onnx",
            },
            ModelKind::BirefnetDis => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-DIS-epoch_590.onnx",
            },
            ModelKind::BirefnetHrsod => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-HRSOD_DHU-epoch_115.onnx",
            },
            ModelKind::BirefnetCod => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-COD-epoch_125.onnx",
            },
            ModelKind::BirefnetMassive => ModelSpec {
                input_size: 1024,
                mean: IMAGENET_MEAN,
                std: IMAGENET_STD,
                head: OutputHead::Saliency { sigmoid: true },
                weight_file: "BiRefNet-massive-TR_DIS5K_TR_TEs-epoch_420.onnx",
            },
            ModelKind::BriaRmbg => ModelSpec {
                input_size: 1024,
                mean: [0.5, 0.5, 0.5],
                std: UNIT_STD,
                head: OutputHead::Saliency { sigmoid: false },
                weight_file: "bria-rmbg.onnx",
            },
        }
    }

    pub fn weight_url(&self) -> String {
        format!("{}/{}", WEIGHT_BASE_URL, self.spec().weight_file)
    }
}
