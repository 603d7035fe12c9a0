// src/tasks/rtl.rs

//! Left-to-right → right-to-left mirroring of a parsed stylesheet.
//!
//! Runs as a lightningcss [`Visitor`] over every declaration: physical
//! left/right properties are renamed, four-sided shorthands and corner radii
//! are swapped, horizontal offsets (shadows, translations, rotations) are
//! negated and left/right keywords are exchanged. Logical properties
//! (`margin-inline-start`, ...) already follow `direction` and stay as they
//! are.

use std::convert::Infallible;

use lightningcss::properties::border::GenericBorder;
use lightningcss::properties::custom::{CustomPropertyName, Token, TokenList, TokenOrValue, UnparsedProperty};
use lightningcss::properties::text::{Direction, TextAlign};
use lightningcss::properties::transform::{Transform, Translate};
use lightningcss::properties::ui::CursorKeyword;
use lightningcss::properties::{Property, PropertyId};
use lightningcss::stylesheet::StyleSheet;
use lightningcss::values::percentage::{DimensionPercentage, Percentage};
use lightningcss::values::position::{HorizontalPosition, HorizontalPositionKeyword};
use lightningcss::values::string::CowArcStr;
use lightningcss::visit_types;
use lightningcss::visitor::{Visit, VisitTypes, Visitor};

/// Properties lightningcss keeps as raw tokens whose keywords still need
/// swapping.
const KEYWORD_PROPERTIES: &[&str] = &["float", "clear"];

/// Mirror every declaration of `sheet` in place.
pub fn mirror_stylesheet(sheet: &mut StyleSheet<'_>) {
    sheet
        .visit(&mut Mirror)
        .unwrap_or_else(|never: Infallible| match never {});
}

struct Mirror;

impl<'i> Visitor<'i> for Mirror {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        visit_types!(PROPERTIES)
    }

    fn visit_property(&mut self, property: &mut Property<'i>) -> Result<(), Self::Error> {
        match mirrored_side(property) {
            Some(renamed) => *property = renamed,
            None => mirror_value(property),
        }
        Ok(())
    }
}

/// Left/right longhands become their opposite property.
fn mirrored_side<'i>(property: &Property<'i>) -> Option<Property<'i>> {
    use Property as P;

    let mirrored = match property {
        P::Left(v) => P::Right(v.clone()),
        P::Right(v) => P::Left(v.clone()),
        P::MarginLeft(v) => P::MarginRight(v.clone()),
        P::MarginRight(v) => P::MarginLeft(v.clone()),
        P::PaddingLeft(v) => P::PaddingRight(v.clone()),
        P::PaddingRight(v) => P::PaddingLeft(v.clone()),
        P::BorderLeftColor(v) => P::BorderRightColor(v.clone()),
        P::BorderRightColor(v) => P::BorderLeftColor(v.clone()),
        P::BorderLeftStyle(v) => P::BorderRightStyle(v.clone()),
        P::BorderRightStyle(v) => P::BorderLeftStyle(v.clone()),
        P::BorderLeftWidth(v) => P::BorderRightWidth(v.clone()),
        P::BorderRightWidth(v) => P::BorderLeftWidth(v.clone()),
        P::BorderLeft(v) => P::BorderRight(GenericBorder {
            width: v.width.clone(),
            style: v.style.clone(),
            color: v.color.clone(),
        }),
        P::BorderRight(v) => P::BorderLeft(GenericBorder {
            width: v.width.clone(),
            style: v.style.clone(),
            color: v.color.clone(),
        }),
        P::BorderTopLeftRadius(v, vp) => P::BorderTopRightRadius(v.clone(), *vp),
        P::BorderTopRightRadius(v, vp) => P::BorderTopLeftRadius(v.clone(), *vp),
        P::BorderBottomLeftRadius(v, vp) => P::BorderBottomRightRadius(v.clone(), *vp),
        P::BorderBottomRightRadius(v, vp) => P::BorderBottomLeftRadius(v.clone(), *vp),
        _ => return None,
    };
    Some(mirrored)
}

fn mirror_value(property: &mut Property<'_>) {
    use Property as P;

    match property {
        P::Margin(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::Padding(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::Inset(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::BorderColor(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::BorderStyle(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::BorderWidth(rect) => std::mem::swap(&mut rect.left, &mut rect.right),
        P::BorderRadius(radius, _) => {
            std::mem::swap(&mut radius.top_left, &mut radius.top_right);
            std::mem::swap(&mut radius.bottom_left, &mut radius.bottom_right);
        }
        P::BoxShadow(shadows, _) => {
            for shadow in shadows.iter_mut() {
                shadow.x_offset = shadow.x_offset.clone() * -1.0;
            }
        }
        P::TextShadow(shadows) => {
            for shadow in shadows.iter_mut() {
                shadow.x_offset = shadow.x_offset.clone() * -1.0;
            }
        }
        P::Transform(list, _) => list.0.iter_mut().for_each(mirror_transform),
        P::Translate(Translate::XYZ { x, .. }) => *x = x.clone() * -1.0,
        P::BackgroundPosition(positions) => {
            for position in positions.iter_mut() {
                mirror_position(&mut position.x);
            }
        }
        P::BackgroundPositionX(positions) => positions.iter_mut().for_each(mirror_position),
        P::Background(layers) => {
            for layer in layers.iter_mut() {
                mirror_position(&mut layer.position.x);
            }
        }
        P::TransformOrigin(position, _) | P::PerspectiveOrigin(position, _) => {
            mirror_position(&mut position.x)
        }
        P::TextAlign(align) => match align {
            TextAlign::Left => *align = TextAlign::Right,
            TextAlign::Right => *align = TextAlign::Left,
            _ => {}
        },
        P::Direction(direction) => match direction {
            Direction::Ltr => *direction = Direction::Rtl,
            Direction::Rtl => *direction = Direction::Ltr,
        },
        P::Cursor(cursor) => {
            if let Some(keyword) = mirrored_cursor(&cursor.keyword) {
                cursor.keyword = keyword;
            }
        }
        P::Custom(custom) => {
            if let CustomPropertyName::Unknown(name) = &custom.name {
                if KEYWORD_PROPERTIES.contains(&&*name.0) {
                    mirror_keywords(&mut custom.value);
                }
            }
        }
        P::Unparsed(unparsed) => mirror_unparsed(unparsed),
        _ => {}
    }
}

/// Declarations holding `var()` stay unparsed; rename the property and swap
/// its keywords.
fn mirror_unparsed(unparsed: &mut UnparsedProperty<'_>) {
    use PropertyId as Id;

    let renamed = match &unparsed.property_id {
        Id::Left => Some(Id::Right),
        Id::Right => Some(Id::Left),
        Id::MarginLeft => Some(Id::MarginRight),
        Id::MarginRight => Some(Id::MarginLeft),
        Id::PaddingLeft => Some(Id::PaddingRight),
        Id::PaddingRight => Some(Id::PaddingLeft),
        Id::BorderLeft => Some(Id::BorderRight),
        Id::BorderRight => Some(Id::BorderLeft),
        Id::BorderLeftColor => Some(Id::BorderRightColor),
        Id::BorderRightColor => Some(Id::BorderLeftColor),
        Id::BorderLeftStyle => Some(Id::BorderRightStyle),
        Id::BorderRightStyle => Some(Id::BorderLeftStyle),
        Id::BorderLeftWidth => Some(Id::BorderRightWidth),
        Id::BorderRightWidth => Some(Id::BorderLeftWidth),
        Id::BorderTopLeftRadius(vp) => Some(Id::BorderTopRightRadius(*vp)),
        Id::BorderTopRightRadius(vp) => Some(Id::BorderTopLeftRadius(*vp)),
        Id::BorderBottomLeftRadius(vp) => Some(Id::BorderBottomRightRadius(*vp)),
        Id::BorderBottomRightRadius(vp) => Some(Id::BorderBottomLeftRadius(*vp)),
        _ => None,
    };
    if let Some(id) = renamed {
        unparsed.property_id = id;
    }
    mirror_keywords(&mut unparsed.value);
}

fn mirror_keywords(tokens: &mut TokenList<'_>) {
    for token in tokens.0.iter_mut() {
        if let TokenOrValue::Token(Token::Ident(ident)) = token {
            let swapped = if ident.eq_ignore_ascii_case("left") {
                "right"
            } else if ident.eq_ignore_ascii_case("right") {
                "left"
            } else {
                continue;
            };
            *ident = CowArcStr::from(swapped);
        }
    }
}

fn mirror_transform(transform: &mut Transform) {
    match transform {
        Transform::TranslateX(x) | Transform::Translate(x, _) | Transform::Translate3d(x, _, _) => {
            *x = x.clone() * -1.0
        }
        Transform::Rotate(angle) | Transform::RotateZ(angle) | Transform::SkewX(angle) => {
            *angle = angle.clone() * -1.0
        }
        Transform::Skew(x, y) => {
            *x = x.clone() * -1.0;
            *y = y.clone() * -1.0;
        }
        _ => {}
    }
}

/// `left` ↔ `right`, `p%` → `(100 - p)%`. Absolute lengths measured from the
/// left edge have no right-edge equivalent without the box size and stay.
fn mirror_position(x: &mut HorizontalPosition) {
    match x {
        HorizontalPosition::Side { side, .. } => {
            *side = match side {
                HorizontalPositionKeyword::Left => HorizontalPositionKeyword::Right,
                HorizontalPositionKeyword::Right => HorizontalPositionKeyword::Left,
            };
        }
        HorizontalPosition::Length(DimensionPercentage::Percentage(Percentage(p))) => *p = 1.0 - *p,
        _ => {}
    }
}

fn mirrored_cursor(keyword: &CursorKeyword) -> Option<CursorKeyword> {
    use CursorKeyword as K;

    Some(match keyword {
        K::EResize => K::WResize,
        K::WResize => K::EResize,
        K::NeResize => K::NwResize,
        K::NwResize => K::NeResize,
        K::SeResize => K::SwResize,
        K::SwResize => K::SeResize,
        K::NeswResize => K::NwseResize,
        K::NwseResize => K::NeswResize,
        _ => return None,
    })
}
