//! Member-map strategy for composite types.
//!
//! A [`CompositePlan`] is computed once per type from its
//! [`CompositeShape`]: the selected members in emission order, each with the
//! checks the write walk needs. The plan is shared by the generated write and
//! read closures and by the CSV writer.
//!
//! Write, per member in plan order:
//!
//! 1. skip when the member is excluded by name in the options
//! 2. skip when its `should_serialize` predicate returns `false`
//! 3. skip a scalar equal to its default when default emission is off
//! 4. skip an absent value unless null values are included
//! 5. otherwise emit `name:value` through the member type's strategy
//!
//! Read assigns every known key through the member's setter. Unknown keys,
//! the discriminator key, and read-only members are skipped.

use crate::cache::{ReadFn, WriteFn};
use crate::de::Reader;
use crate::reflect::{
    AnyBox, CompositeShape, Getter, MemberShape, Predicate, Reflect, Setter, Shape, TypeDescriptor,
};
use crate::ser::Writer;
use crate::value::Value;
use crate::Options;
use std::any::Any;
use std::sync::Arc;

/// How a member detects that it holds its type's default.
#[derive(Clone, Copy)]
enum DefaultCheck {
    Primitive(fn(&dyn Any) -> bool),
    /// Enumerations default to the variant with integer value 0.
    Enum(fn(&dyn Any) -> Option<i64>),
}

impl DefaultCheck {
    fn is_default(&self, value: &dyn Any) -> bool {
        match self {
            DefaultCheck::Primitive(check) => check(value),
            DefaultCheck::Enum(to_int) => to_int(value) == Some(0),
        }
    }
}

/// How a member detects an absent value.
#[derive(Clone, Copy)]
enum Absence {
    Never,
    Optional(for<'a> fn(&'a dyn Any) -> Option<&'a dyn Reflect>),
    Dynamic,
}

impl Absence {
    fn of(shape: &Shape) -> Self {
        match shape {
            Shape::Optional(option) => Absence::Optional(option.get),
            Shape::Dynamic => Absence::Dynamic,
            _ => Absence::Never,
        }
    }

    fn is_absent(&self, value: &dyn Any) -> bool {
        match self {
            Absence::Never => false,
            Absence::Optional(get) => get(value).is_none(),
            Absence::Dynamic => value.downcast_ref::<Value>().is_some_and(Value::is_null),
        }
    }
}

/// One selected member.
pub(crate) struct MemberPlan {
    pub(crate) name: String,
    normalized: String,
    exclusion_key: String,
    pub(crate) descriptor: TypeDescriptor,
    pub(crate) get: Getter,
    pub(crate) set: Option<Setter>,
    should_serialize: Option<Predicate>,
    suppress_default: Option<DefaultCheck>,
    absence: Absence,
}

impl MemberPlan {
    fn new(owner_short_name: &str, member: MemberShape) -> Self {
        let member_shape = member.descriptor.shape();
        let suppress_default = if member.emit_default_value {
            None
        } else {
            match &member_shape {
                Shape::Primitive(p) => Some(DefaultCheck::Primitive(p.is_default)),
                Shape::Enum(e) => Some(DefaultCheck::Enum(e.to_int)),
                _ => None,
            }
        };
        MemberPlan {
            normalized: normalize(&member.name),
            exclusion_key: format!("{}.{}", owner_short_name, member.name),
            absence: Absence::of(&member_shape),
            name: member.name,
            descriptor: member.descriptor,
            get: member.get,
            set: member.set,
            should_serialize: member.should_serialize,
            suppress_default,
        }
    }

    /// Whether the member is written for `owner`, given its current value.
    fn is_emitted(&self, owner: &dyn Any, value: &dyn Any, include_null_values: bool) -> bool {
        if let Some(predicate) = &self.should_serialize {
            if !predicate(owner) {
                return false;
            }
        }
        if let Some(check) = &self.suppress_default {
            if check.is_default(value) {
                return false;
            }
        }
        include_null_values || !self.absence.is_absent(value)
    }
}

/// Lowercase with `_` and `-` removed, so `firstName`, `first_name` and
/// `FirstName` name the same member.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The resolved member layout of a composite type.
pub(crate) struct CompositePlan {
    pub(crate) type_name: &'static str,
    pub(crate) short_name: String,
    pub(crate) construct: fn() -> AnyBox,
    pub(crate) members: Vec<MemberPlan>,
}

impl CompositePlan {
    pub(crate) fn new(descriptor: TypeDescriptor, shape: CompositeShape) -> Self {
        let short_name = descriptor.short_name();
        let data_contract = shape.data_contract;
        let mut selected: Vec<MemberShape> = shape
            .members
            .into_iter()
            .filter(|m| !m.ignore && (!data_contract || m.data_member))
            .collect();
        // stable: ordered members first by order, the rest keep declaration order
        selected.sort_by_key(|m| match m.order {
            Some(order) => (0, order),
            None => (1, 0),
        });
        let members = selected
            .into_iter()
            .map(|m| MemberPlan::new(&short_name, m))
            .collect();
        CompositePlan {
            type_name: descriptor.name(),
            short_name,
            construct: shape.construct,
            members,
        }
    }

    /// Finds a member by exact name, then by normalized name.
    pub(crate) fn find(&self, key: &str) -> Option<&MemberPlan> {
        self.members.iter().find(|m| m.name == key).or_else(|| {
            let normalized = normalize(key);
            self.members.iter().find(|m| m.normalized == normalized)
        })
    }

    /// Members not excluded by name in `options`, in emission order.
    pub(crate) fn columns(&self, options: &Options) -> Vec<&MemberPlan> {
        self.members
            .iter()
            .filter(|m| !options.excluded_members.contains(&m.exclusion_key))
            .collect()
    }

    /// Members written for `owner` under the current options, with their values.
    pub(crate) fn emitted<'v>(
        &'v self,
        writer: &Writer<'_>,
        owner: &'v dyn Reflect,
    ) -> Vec<(&'v MemberPlan, &'v dyn Reflect)> {
        let options = writer.options();
        let any = owner.as_any();
        self.columns(options)
            .into_iter()
            .filter_map(|m| (m.get)(any).map(|value| (m, value)))
            .filter(|(m, value)| m.is_emitted(any, value.as_any(), options.include_null_values))
            .collect()
    }

    fn write(&self, writer: &mut Writer<'_>, value: &dyn Reflect) -> crate::Result<()> {
        let options = writer.options();
        let requested = writer.take_type_info();
        let with_type = match options.type_info_override(&self.short_name) {
            Some(forced) => forced,
            None => (requested || options.include_type_info) && !options.exclude_type_info,
        };
        writer.push('{');
        let mut first = true;
        if with_type {
            let name = if options.prefer_interfaces {
                value.interface_name().unwrap_or(self.type_name)
            } else {
                self.type_name
            };
            writer.write_key(&options.type_attr);
            writer.push(':');
            writer.write_string(name);
            first = false;
        }
        for (member, member_value) in self.emitted(writer, value) {
            if !first {
                writer.push(',');
            }
            first = false;
            writer.write_key(&options.naming.apply(&member.name));
            writer.push(':');
            writer.write_value(member.descriptor, member_value)?;
        }
        writer.push('}');
        Ok(())
    }

    fn read(&self, reader: &mut Reader<'_>, text: &str) -> crate::Result<AnyBox> {
        let mut target = (self.construct)();
        if reader.is_null(text) || reader.depth_exhausted() {
            return Ok(target);
        }
        let type_attr = &reader.options().type_attr;
        let entries = reader.cursor(text).map_entries()?;
        for (key, token) in entries {
            let key = reader.unquote(key)?;
            if key == type_attr.as_str() {
                continue;
            }
            let Some(member) = self.find(&key) else {
                tracing::trace!(type_name = self.type_name, key = %key, "unknown member skipped");
                continue;
            };
            let Some(set) = &member.set else {
                continue;
            };
            let value = reader.read_value(member.descriptor, token)?;
            set(&mut *target, value)?;
        }
        Ok(target)
    }
}

/// Builds the plan and the strategy closures of a composite type.
pub(crate) fn strategy(
    descriptor: TypeDescriptor,
    shape: CompositeShape,
) -> (WriteFn, ReadFn, Arc<CompositePlan>) {
    let plan = Arc::new(CompositePlan::new(descriptor, shape));
    let write_plan = Arc::clone(&plan);
    let read_plan = Arc::clone(&plan);
    let write: WriteFn = Arc::new(move |writer: &mut Writer<'_>, value: &dyn Reflect| {
        write_plan.write(writer, value)
    });
    let read: ReadFn =
        Arc::new(move |reader: &mut Reader<'_>, text: &str| read_plan.read(reader, text));
    (write, read, plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::MemberAttrs;

    #[derive(Default)]
    struct Ordered {
        a: i32,
        b: i32,
        c: i32,
        hidden: i32,
    }

    impl Reflect for Ordered {
        fn shape() -> Shape {
            Shape::composite::<Ordered>()
                .member("A", |o: &Ordered| &o.a, |o: &mut Ordered, v| o.a = v)
                .member_with(
                    "B",
                    |o: &Ordered| &o.b,
                    |o: &mut Ordered, v| o.b = v,
                    MemberAttrs::new().order(2),
                )
                .member_with(
                    "C",
                    |o: &Ordered| &o.c,
                    |o: &mut Ordered, v| o.c = v,
                    MemberAttrs::new().order(1),
                )
                .member_with(
                    "Hidden",
                    |o: &Ordered| &o.hidden,
                    |o: &mut Ordered, v| o.hidden = v,
                    MemberAttrs::new().ignore(),
                )
                .build()
        }
    }

    fn plan_of<T: Reflect>() -> CompositePlan {
        let descriptor = TypeDescriptor::of::<T>();
        let Shape::Composite(shape) = descriptor.shape() else {
            panic!("expected composite");
        };
        CompositePlan::new(descriptor, shape)
    }

    #[test]
    fn test_ordered_members_first_then_declaration_order() {
        let plan = plan_of::<Ordered>();
        let names: Vec<_> = plan.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(plan.short_name, "Ordered");
    }

    #[test]
    fn test_find_is_lenient_about_case_and_separators() {
        let plan = plan_of::<Ordered>();
        assert!(plan.find("A").is_some());
        assert!(plan.find("a").is_some());
        assert!(plan.find("hidden").is_none());
        assert_eq!(normalize("first_Name"), normalize("FirstName"));
        assert_eq!(normalize("first-name"), "firstname");
    }
}
