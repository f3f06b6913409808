//! BVH motion capture parser.
//!
//! Follows the published Biovision format: a `HIERARCHY` section of nested
//! `ROOT`/`JOINT` blocks with `OFFSET` and `CHANNELS`, then a `MOTION`
//! section with one line of channel values per frame. Angles are degrees and
//! the rotation channels of a joint compose in the order they are listed.

use std::str::FromStr;

use glam::{Quat, Vec3};

use crate::animation::{AnimationClip, KeyframeTrack, SourceClip, Track};
use crate::assets::avatar::{MotionParser, ParsedMotion};
use crate::assets::loaders::sanitize_node_name;
use crate::errors::ParseError;
use crate::scene::{Bone, RestPose, Skeleton};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl Channel {
    fn parse(token: &str) -> Option<Self> {
        let channel = match token.to_ascii_lowercase().as_str() {
            "xposition" => Channel::Xposition,
            "yposition" => Channel::Yposition,
            "zposition" => Channel::Zposition,
            "xrotation" => Channel::Xrotation,
            "yrotation" => Channel::Yrotation,
            "zrotation" => Channel::Zrotation,
            _ => return None,
        };
        Some(channel)
    }

    fn is_position(self) -> bool {
        matches!(
            self,
            Channel::Xposition | Channel::Yposition | Channel::Zposition
        )
    }
}

#[derive(Debug)]
struct Joint {
    name: String,
    parent: Option<usize>,
    offset: Vec3,
    channels: Vec<Channel>,
    /// Index of this joint's first value within a frame.
    first_value: usize,
}

/// Whitespace tokens tagged with their 1-based line number.
struct Tokens<'a> {
    items: Vec<(&'a str, usize)>,
    pos: usize,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let items: Vec<(&str, usize)> = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (t, i + 1)))
            .collect();
        let last_line = text.lines().count().max(1);
        Self {
            items,
            pos: 0,
            last_line,
        }
    }

    fn remaining(&self) -> usize {
        self.items.len() - self.pos
    }

    fn line(&self) -> usize {
        self.items
            .get(self.pos)
            .or_else(|| self.items.last())
            .map_or(self.last_line, |&(_, line)| line)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Bvh {
            line: self.line(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.items.get(self.pos).map(|&(t, _)| t)
    }

    fn next(&mut self) -> Result<&'a str, ParseError> {
        let token = self
            .peek()
            .ok_or_else(|| self.error("unexpected end of file"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, word: &str) -> Result<(), ParseError> {
        let token = self.next()?;
        if token.eq_ignore_ascii_case(word) {
            Ok(())
        } else {
            self.pos -= 1;
            Err(self.error(format!("expected '{word}', found '{token}'")))
        }
    }

    fn number<T: FromStr>(&mut self) -> Result<T, ParseError> {
        let token = self.next()?;
        token.parse().map_err(|_| {
            self.pos -= 1;
            self.error(format!("expected a number, found '{token}'"))
        })
    }

    fn vec3(&mut self) -> Result<Vec3, ParseError> {
        Ok(Vec3::new(self.number()?, self.number()?, self.number()?))
    }
}

/// Parser for `.bvh` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BvhParser;

impl BvhParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, text: &str) -> Result<ParsedMotion, ParseError> {
        let mut tokens = Tokens::new(text);

        tokens.expect("HIERARCHY")?;
        let mut joints = Vec::new();
        let mut value_count = 0;
        while tokens
            .peek()
            .is_some_and(|t| t.eq_ignore_ascii_case("ROOT"))
        {
            tokens.next()?;
            parse_joint(&mut tokens, None, &mut joints, &mut value_count)?;
        }
        if joints.is_empty() {
            return Err(tokens.error("expected ROOT"));
        }

        tokens.expect("MOTION")?;
        let frames_line = tokens.line();
        let frames = parse_frame_count(&mut tokens)?;
        if frames == 0 {
            return Err(ParseError::Bvh {
                line: frames_line,
                message: "motion has no frames".into(),
            });
        }
        tokens.expect("Frame")?;
        let time_line = tokens.line();
        tokens.expect("Time:")?;
        let frame_time: f32 = tokens.number()?;
        if frame_time.is_nan() || frame_time <= 0.0 {
            return Err(ParseError::Bvh {
                line: time_line,
                message: format!("frame time must be positive, got {frame_time}"),
            });
        }

        let remaining = tokens.remaining();
        let total = frames
            .checked_mul(value_count)
            .filter(|&total| total <= remaining)
            .ok_or_else(|| ParseError::Bvh {
                line: frames_line,
                message: format!("declares {frames} frames but holds only {remaining} values"),
            })?;

        let mut values = Vec::with_capacity(total);
        for _ in 0..total {
            values.push(tokens.number::<f32>()?);
        }
        if let Some(extra) = tokens.peek() {
            log::warn!(
                "BVH: ignoring trailing data from line {} ('{extra}')",
                tokens.line()
            );
        }

        let skeleton = build_skeleton(&joints)?;
        let clip = build_clip(&joints, &values, value_count, frames, frame_time);
        clip.validate()?;

        log::debug!(
            "BVH: {} joints, {} channels, {frames} frames at {frame_time}s",
            joints.len(),
            value_count
        );

        Ok(ParsedMotion { skeleton, clip })
    }
}

impl MotionParser for BvhParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedMotion, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParseError::InvalidData(format!("BVH is not UTF-8: {e}")))?;
        self.parse_str(text)
    }
}

/// Parses a joint after its `ROOT`/`JOINT` keyword.
fn parse_joint(
    tokens: &mut Tokens<'_>,
    parent: Option<usize>,
    joints: &mut Vec<Joint>,
    value_count: &mut usize,
) -> Result<(), ParseError> {
    let name = sanitize_node_name(tokens.next()?);
    tokens.expect("{")?;
    tokens.expect("OFFSET")?;
    let offset = tokens.vec3()?;

    let mut channels = Vec::new();
    if tokens
        .peek()
        .is_some_and(|t| t.eq_ignore_ascii_case("CHANNELS"))
    {
        tokens.next()?;
        let count: usize = tokens.number()?;
        for _ in 0..count {
            let token = tokens.next()?;
            let channel = Channel::parse(token).ok_or_else(|| {
                tokens.pos -= 1;
                tokens.error(format!("unknown channel '{token}'"))
            })?;
            channels.push(channel);
        }
    }

    let index = joints.len();
    joints.push(Joint {
        name,
        parent,
        offset,
        first_value: *value_count,
        channels,
    });
    *value_count += joints[index].channels.len();

    loop {
        let token = tokens.next()?;
        if token == "}" {
            return Ok(());
        }
        if token.eq_ignore_ascii_case("JOINT") {
            parse_joint(tokens, Some(index), joints, value_count)?;
        } else if token.eq_ignore_ascii_case("End") {
            tokens.expect("Site")?;
            skip_end_site(tokens)?;
        } else {
            tokens.pos -= 1;
            return Err(tokens.error(format!("unexpected '{token}' in joint block")));
        }
    }
}

/// End Sites only mark where a chain ends; they carry no animation.
fn skip_end_site(tokens: &mut Tokens<'_>) -> Result<(), ParseError> {
    tokens.expect("{")?;
    tokens.expect("OFFSET")?;
    tokens.vec3()?;
    tokens.expect("}")
}

/// Reads `Frames: N` (also accepting `Frames:N`).
fn parse_frame_count(tokens: &mut Tokens<'_>) -> Result<usize, ParseError> {
    let token = tokens.next()?;
    let Some(rest) = token
        .strip_prefix("Frames:")
        .or_else(|| token.strip_prefix("FRAMES:"))
    else {
        tokens.pos -= 1;
        return Err(tokens.error(format!("expected 'Frames:', found '{token}'")));
    };
    if rest.is_empty() {
        tokens.number()
    } else {
        rest.parse()
            .map_err(|_| tokens.error(format!("invalid frame count '{rest}'")))
    }
}

fn build_skeleton(joints: &[Joint]) -> Result<Skeleton, ParseError> {
    let bones = joints
        .iter()
        .map(|j| Bone::new(j.name.clone(), j.parent, RestPose::from_translation(j.offset)))
        .collect();
    Ok(Skeleton::new("bvh", bones)?)
}

fn build_clip(
    joints: &[Joint],
    values: &[f32],
    stride: usize,
    frames: usize,
    frame_time: f32,
) -> SourceClip {
    let times: Vec<f32> = (0..frames).map(|i| i as f32 * frame_time).collect();

    let tracks = joints
        .iter()
        .filter(|joint| !joint.channels.is_empty())
        .map(|joint| {
            let frame_values = |f: usize| {
                let start = f * stride + joint.first_value;
                &values[start..start + joint.channels.len()]
            };

            let has_rotation = joint.channels.iter().any(|c| !c.is_position());
            let rotation = if has_rotation {
                let rotations = (0..frames)
                    .map(|f| compose_rotation(&joint.channels, frame_values(f)))
                    .collect();
                KeyframeTrack::linear(times.clone(), rotations)
            } else {
                KeyframeTrack::constant(Quat::IDENTITY)
            };

            let mut track = Track::new(joint.name.clone(), rotation);
            if joint.channels.iter().any(|c| c.is_position()) {
                let positions = (0..frames)
                    .map(|f| compose_position(joint.offset, &joint.channels, frame_values(f)))
                    .collect();
                track = track.with_translation(KeyframeTrack::linear(times.clone(), positions));
            }
            track
        })
        .collect();

    AnimationClip::new("", tracks)
}

/// Rotation channels applied in listed order: `Z X Y` gives `Rz * Rx * Ry`.
fn compose_rotation(channels: &[Channel], values: &[f32]) -> Quat {
    channels
        .iter()
        .zip(values)
        .fold(Quat::IDENTITY, |q, (&channel, &degrees)| {
            let angle = degrees.to_radians();
            let axis = match channel {
                Channel::Xrotation => Quat::from_rotation_x(angle),
                Channel::Yrotation => Quat::from_rotation_y(angle),
                Channel::Zrotation => Quat::from_rotation_z(angle),
                _ => return q,
            };
            q * axis
        })
        .normalize()
}

/// Position channels replace the matching offset component.
fn compose_position(offset: Vec3, channels: &[Channel], values: &[f32]) -> Vec3 {
    channels
        .iter()
        .zip(values)
        .fold(offset, |mut p, (&channel, &value)| {
            match channel {
                Channel::Xposition => p.x = value,
                Channel::Yposition => p.y = value,
                Channel::Zposition => p.z = value,
                _ => {}
            }
            p
        })
}
