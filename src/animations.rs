use crate::gameflow::GameplaySet;
use bevy::prelude::*;
use bevy::sprite::Anchor;
use bevy_spritesheet_animation::prelude::*;
use bevy_spritesheet_animation::prelude::Clip as SheetClip;
use std::collections::HashMap;

pub const DEFAULT_FRAME_MS: u32 = 100;

// ====== Clip names ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Clip {
    #[default]
    Idle,
    Walk,
    Attack,
    Hit,
    Death,
    Jump,
    Fall,
    Run,
    Climb,
}

impl Clip {
    pub fn name(self) -> &'static str {
        match self {
            Clip::Idle => "Idle",
            Clip::Walk => "Walk",
            Clip::Attack => "Attack",
            Clip::Hit => "hit",
            Clip::Death => "death",
            Clip::Jump => "jump",
            Clip::Fall => "fall",
            Clip::Run => "run",
            Clip::Climb => "climb",
        }
    }

    pub fn looping(self) -> bool {
        !matches!(self, Clip::Attack | Clip::Hit | Clip::Death)
    }
}

// ====== Playhead ======

/// What the behavior code is allowed to know about a playing clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationView {
    pub clip: Clip,
    pub frame: usize,
    pub finished: bool,
}

/// Mirrors the sprite animation so gameplay can read the clip and frame index
/// without poking at renderer state.
#[derive(Component, Debug, Clone, Default)]
pub struct Playhead {
    clip: Clip,
    frame: usize,
    elapsed: f32,
    finished: bool,
    rewound: bool,
    pub flip_x: bool,
}

impl Playhead {
    pub fn request(&mut self, clip: Clip) -> bool {
        if self.clip == clip {
            return false;
        }
        self.clip = clip;
        self.frame = 0;
        self.elapsed = 0.0;
        self.finished = false;
        true
    }

    /// Restarts the clip even if it is already current.
    pub fn restart(&mut self, clip: Clip) {
        self.rewound = self.clip == clip;
        self.clip = clip;
        self.frame = 0;
        self.elapsed = 0.0;
        self.finished = false;
    }

    /// True once after `restart` rewound the clip that was already playing.
    fn take_rewind(&mut self) -> bool {
        std::mem::take(&mut self.rewound)
    }

    pub fn advance(&mut self, dt: f32, frames: usize, looping: bool) {
        if self.finished {
            return;
        }
        let frames = frames.max(1);
        let frame_secs = DEFAULT_FRAME_MS as f32 / 1000.0;
        self.elapsed += dt;
        while self.elapsed >= frame_secs {
            self.elapsed -= frame_secs;
            if self.frame + 1 < frames {
                self.frame += 1;
            } else if looping {
                self.frame = 0;
            } else {
                self.finished = true;
                self.elapsed = 0.0;
                break;
            }
        }
    }

    pub fn clip(&self) -> Clip {
        self.clip
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn view(&self) -> AnimationView {
        AnimationView {
            clip: self.clip,
            frame: self.frame,
            finished: self.finished,
        }
    }
}

// ====== Sheets ======

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetId {
    Player,
    Goblin,
    Skeleton,
    Balrog,
}

struct SheetLayout {
    id: SheetId,
    prefix: &'static str,
    image: &'static str,
    frame_w: u32,
    frame_h: u32,
    anchor_y: f32,
    // (clip, row, frame count)
    rows: &'static [(Clip, usize, usize)],
}

const SHEETS: &[SheetLayout] = &[
    SheetLayout {
        id: SheetId::Player,
        prefix: "player",
        image: "sprites/player.png",
        frame_w: 48,
        frame_h: 48,
        anchor_y: -0.2,
        rows: &[
            (Clip::Idle, 0, 6),
            (Clip::Run, 1, 8),
            (Clip::Jump, 2, 3),
            (Clip::Fall, 3, 3),
            (Clip::Climb, 4, 4),
            (Clip::Hit, 5, 3),
            (Clip::Death, 6, 8),
        ],
    },
    SheetLayout {
        id: SheetId::Goblin,
        prefix: "goblin",
        image: "sprites/goblin.png",
        frame_w: 48,
        frame_h: 48,
        anchor_y: -0.2,
        rows: &[
            (Clip::Idle, 0, 4),
            (Clip::Walk, 1, 8),
            (Clip::Attack, 2, 6),
            (Clip::Death, 3, 4),
        ],
    },
    SheetLayout {
        id: SheetId::Skeleton,
        prefix: "skeleton",
        image: "sprites/skeleton.png",
        frame_w: 48,
        frame_h: 48,
        anchor_y: -0.2,
        rows: &[
            (Clip::Idle, 0, 4),
            (Clip::Walk, 1, 8),
            (Clip::Attack, 2, 4),
            (Clip::Death, 3, 4),
        ],
    },
    SheetLayout {
        id: SheetId::Balrog,
        prefix: "balrog",
        image: "sprites/balrog.png",
        frame_w: 96,
        frame_h: 96,
        anchor_y: -0.3,
        rows: &[
            (Clip::Idle, 0, 6),
            (Clip::Walk, 1, 8),
            (Clip::Attack, 2, 8),
            (Clip::Death, 3, 6),
        ],
    },
];

#[derive(Debug, Clone, Copy)]
pub struct ClipInfo {
    pub animation: AnimationId,
    pub frames: usize,
    pub looping: bool,
}

#[derive(Resource, Default)]
pub struct ClipLibrary {
    clips: HashMap<(SheetId, Clip), ClipInfo>,
    images: HashMap<SheetId, (Handle<Image>, Handle<TextureAtlasLayout>, f32)>,
}

impl ClipLibrary {
    pub fn get(&self, sheet: SheetId, clip: Clip) -> Option<ClipInfo> {
        self.clips.get(&(sheet, clip)).copied()
    }
}

pub struct ActorAnimationsPlugin;

impl Plugin for ActorAnimationsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ClipLibrary>()
            .add_systems(Startup, register_sheets)
            .add_systems(Update, attach_sprites)
            .add_systems(Update, drive_playheads.in_set(GameplaySet::Cleanup));
    }
}

fn register_sheets(
    mut atlas_layouts: ResMut<Assets<TextureAtlasLayout>>,
    assets: Res<AssetServer>,
    mut library: ResMut<AnimationLibrary>,
    mut clips: ResMut<ClipLibrary>,
) {
    for sheet in SHEETS {
        let columns = sheet.rows.iter().map(|r| r.2).max().unwrap_or(1);
        let rows = sheet.rows.iter().map(|r| r.1 + 1).max().unwrap_or(1);
        let spritesheet = Spritesheet::new(columns, rows);

        let layout = atlas_layouts.add(spritesheet.atlas_layout(sheet.frame_w, sheet.frame_h));
        clips
            .images
            .insert(sheet.id, (assets.load(sheet.image), layout, sheet.anchor_y));

        for &(clip, row, frames) in sheet.rows {
            let frame_range = if frames == columns {
                spritesheet.row(row)
            } else {
                spritesheet.row_partial(row, 0..=frames.saturating_sub(1))
            };

            let sheet_clip = SheetClip::from_frames(frame_range)
                .with_duration(AnimationDuration::PerFrame(DEFAULT_FRAME_MS));
            let clip_id = library.register_clip(sheet_clip);
            let animation = if clip.looping() {
                Animation::from_clip(clip_id)
            } else {
                Animation::from_clip(clip_id).with_repetitions(AnimationRepeat::Times(1))
            };
            let anim_id = library.register_animation(animation);
            let _ = library.name_animation(anim_id, &format!("{}:{}", sheet.prefix, clip.name()));

            clips.clips.insert(
                (sheet.id, clip),
                ClipInfo {
                    animation: anim_id,
                    frames,
                    looping: clip.looping(),
                },
            );
        }
    }
}

/// Gives every newly spawned actor its sprite once the sheet is registered.
fn attach_sprites(
    mut commands: Commands,
    clips: Res<ClipLibrary>,
    added: Query<(Entity, &SheetId), Added<SheetId>>,
) {
    for (e, sheet) in &added {
        let Some((image, layout, anchor_y)) = clips.images.get(sheet) else {
            warn!("no spritesheet registered for {:?}", sheet);
            continue;
        };
        let Some(idle) = clips.get(*sheet, Clip::Idle) else {
            warn!("sheet {:?} has no Idle clip", sheet);
            continue;
        };

        let mut sprite = Sprite::from_atlas_image(
            image.clone(),
            TextureAtlas {
                layout: layout.clone(),
                ..Default::default()
            },
        );
        sprite.anchor = Anchor::Custom(Vec2::new(0.0, *anchor_y));

        let mut anim = SpritesheetAnimation::from_id(idle.animation);
        anim.playing = true;

        commands.entity(e).try_insert((sprite, anim));
    }
}

/// Advances every playhead and keeps the sprite animation on the same clip.
fn drive_playheads(
    time: Res<Time>,
    clips: Res<ClipLibrary>,
    mut q: Query<(
        &SheetId,
        &mut Playhead,
        Option<&mut SpritesheetAnimation>,
        Option<&mut Sprite>,
    )>,
) {
    let dt = time.delta_secs();
    for (sheet, mut head, anim, sprite) in &mut q {
        let info = clips.get(*sheet, head.clip());
        let (frames, looping) = info
            .map(|i| (i.frames, i.looping))
            .unwrap_or((1, head.clip().looping()));
        head.advance(dt, frames, looping);

        if let (Some(mut anim), Some(info)) = (anim, info) {
            if anim.animation_id != info.animation {
                anim.switch(info.animation);
            } else if head.take_rewind() {
                anim.reset();
            }
            anim.playing = !head.view().finished;
        }
        if let Some(mut sprite) = sprite {
            sprite.flip_x = head.flip_x;
        }
    }
}
