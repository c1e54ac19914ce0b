//! Cross-reference walks over a decoded stream
//!
//! These follow the reference chains renderers need: texture lists down to
//! bitmap names, models down to meshes or skeletons, and placements to the
//! name of the model they place.

use serde::Serialize;
use std::collections::BTreeMap;

use super::file::WldFile;
use super::fragment::{
    AnimationReference, FragmentData, Mesh, MeshReference, Model, ObjectPlacement,
    SkeletonTrackSet, TextureBitmap, TextureBitmapNameList, TextureList, TextureReference,
};

/// One resolved texture slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Texture {
    /// Flags of the texture reference (0x30)
    pub flags: u32,
    /// Bitmap names; several for an animated texture, one per frame
    pub names: Vec<String>,
    /// Frame delay in milliseconds, for animated textures
    pub animation_delay: Option<i32>,
}

impl Texture {
    /// Whether the texture cycles through frames
    pub fn is_animated(&self) -> bool {
        self.animation_delay.is_some()
    }
}

/// The resolved textures of one texture list (0x31)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureSet {
    /// 1-based sequence number of the list, as meshes reference it
    pub list_index: u32,
    /// Resolved slots keyed by position in the list; unresolvable slots
    /// are absent
    pub textures: BTreeMap<usize, Texture>,
}

/// A named model whose first reference leads to a mesh
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StaticModel<'a> {
    /// Model name
    pub name: &'a str,
    /// Sequence number of the model fragment
    pub model_index: u32,
    /// The mesh
    pub mesh: &'a Mesh,
}

/// A model built from skeletons
#[derive(Debug, Clone, Serialize)]
pub struct AnimatedModel<'a> {
    /// Model name, if the fragment has one
    pub name: Option<&'a str>,
    /// Sequence number of the model fragment
    pub model_index: u32,
    /// Skeletons reached through the model's animation references
    pub skeletons: Vec<&'a SkeletonTrackSet>,
}

/// An object placement together with the name of the model it places
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Placement<'a> {
    /// Name the placement refers to, when it refers by name
    pub model_name: Option<&'a str>,
    /// The placement record
    pub placement: &'a ObjectPlacement,
}

impl WldFile {
    /// Resolve every texture list into its bitmap names
    ///
    /// A slot resolves through its texture reference (0x30) either directly
    /// to bitmap names (0x03), or through a bitmap reference (0x05) to a
    /// bitmap (0x04) whose frames each contribute their first name. Lists
    /// with no resolvable slot are left out.
    pub fn texture_sets(&self) -> Vec<TextureSet> {
        let mut sets = Vec::new();
        for (_, list) in self.fragments_of::<TextureList>() {
            let textures: BTreeMap<usize, Texture> = list
                .references
                .iter()
                .enumerate()
                .filter_map(|(slot, reference)| {
                    let texture = self.resolve_as::<TextureReference>(reference)?;
                    self.resolve_texture(texture).map(|resolved| (slot, resolved))
                })
                .collect();

            if !textures.is_empty() {
                sets.push(TextureSet {
                    list_index: list.position + 1,
                    textures,
                });
            }
        }
        sets
    }

    fn resolve_texture(&self, texture: &TextureReference) -> Option<Texture> {
        let (names, animation_delay) = match &self.resolve(&texture.reference)?.data {
            FragmentData::TextureBitmapNameList(list) => (list.names.clone(), None),
            FragmentData::TextureBitmapReference(bitmap_ref) => {
                let bitmap = self.resolve_as::<TextureBitmap>(&bitmap_ref.reference)?;
                let names = bitmap
                    .references
                    .iter()
                    .filter_map(|frame| self.resolve_as::<TextureBitmapNameList>(frame))
                    .filter_map(|list| list.names.first().cloned())
                    .collect();
                (names, bitmap.animation_delay())
            }
            _ => return None,
        };

        if names.is_empty() {
            return None;
        }
        Some(Texture {
            flags: texture.flags,
            names,
            animation_delay,
        })
    }

    /// Named models whose first reference leads through a mesh reference
    /// (0x2D) to a mesh (0x36)
    pub fn static_models(&self) -> Vec<StaticModel<'_>> {
        self.fragments_of::<Model>()
            .filter_map(|(fragment, model)| {
                let name = self.name(fragment)?;
                let mesh_ref = self.resolve_as::<MeshReference>(model.references.first()?)?;
                Some(StaticModel {
                    name,
                    model_index: fragment.index,
                    mesh: self.resolve_as::<Mesh>(&mesh_ref.reference)?,
                })
            })
            .collect()
    }

    /// Models whose references lead through animation references (0x11) to
    /// skeletons (0x10)
    pub fn animated_models(&self) -> Vec<AnimatedModel<'_>> {
        self.fragments_of::<Model>()
            .filter_map(|(fragment, model)| {
                let skeletons: Vec<&SkeletonTrackSet> = model
                    .references
                    .iter()
                    .filter_map(|reference| self.resolve_as::<AnimationReference>(reference))
                    .filter_map(|animation| self.resolve_as(&animation.reference))
                    .collect();

                (!skeletons.is_empty()).then(|| AnimatedModel {
                    name: self.name(fragment),
                    model_index: fragment.index,
                    skeletons,
                })
            })
            .collect()
    }

    /// Object placements with the model names they refer to
    pub fn placements(&self) -> Vec<Placement<'_>> {
        self.fragments_of::<ObjectPlacement>()
            .map(|(_, placement)| Placement {
                model_name: placement.model.map(|name| self.name_text(name)),
                placement,
            })
            .collect()
    }
}
