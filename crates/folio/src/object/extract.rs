//! Partition of an object shape into storage groups.

use super::MemberRole;
use crate::catalog::TableKind;

/// Member indices grouped by the table class they are stored in.
///
/// Every group keeps member order. The scalar group starts with the instance
/// id and then lists the instance table columns in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberGroups {
    /// Instance id followed by the scalar members.
    pub scalars: Vec<usize>,
    /// Primitive and string arrays.
    pub primitive_arrays: Vec<usize>,
    /// Blob arrays.
    pub blob_arrays: Vec<usize>,
    /// Reference arrays.
    pub reference_arrays: Vec<usize>,
}

impl MemberGroups {
    /// Partition `roles`. Fails unless exactly one instance id is present.
    pub fn extract<I>(roles: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = MemberRole>,
    {
        let mut groups = MemberGroups::default();
        let mut instance_id = None;

        for (index, role) in roles.into_iter().enumerate() {
            match role.table_kind() {
                _ if role == MemberRole::InstanceId => {
                    if instance_id.replace(index).is_some() {
                        return Err("more than one instance id member".into());
                    }
                }
                Some(TableKind::PrimitiveArray) => groups.primitive_arrays.push(index),
                Some(TableKind::BlobArray) => groups.blob_arrays.push(index),
                Some(TableKind::ReferenceArray) => groups.reference_arrays.push(index),
                Some(TableKind::Instance) | None => groups.scalars.push(index),
            }
        }

        let instance_id = instance_id.ok_or("no instance id member")?;
        groups.scalars.insert(0, instance_id);
        Ok(groups)
    }

    /// Index of the instance id member.
    pub fn instance_id(&self) -> usize {
        self.scalars[0]
    }

    /// Scalar members without the instance id, in column order.
    pub fn columns(&self) -> &[usize] {
        &self.scalars[1..]
    }

    /// Array members of one satellite kind.
    pub fn arrays(&self, kind: TableKind) -> &[usize] {
        match kind {
            TableKind::Instance => &[],
            TableKind::PrimitiveArray => &self.primitive_arrays,
            TableKind::BlobArray => &self.blob_arrays,
            TableKind::ReferenceArray => &self.reference_arrays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;

    #[test]
    fn test_partition_preserves_order() {
        let roles = [
            MemberRole::String,
            MemberRole::PrimitiveArray(DataType::Int32),
            MemberRole::InstanceId,
            MemberRole::BlobArray,
            MemberRole::Reference,
            MemberRole::StringArray,
            MemberRole::ReferenceArray,
            MemberRole::PrimitiveBlob(DataType::Float),
            MemberRole::Blob,
        ];
        let groups = MemberGroups::extract(roles).unwrap();

        assert_eq!(groups.instance_id(), 2);
        assert_eq!(groups.scalars, [2, 0, 4, 7, 8]);
        assert_eq!(groups.columns(), [0, 4, 7, 8]);
        assert_eq!(groups.primitive_arrays, [1, 5]);
        assert_eq!(groups.blob_arrays, [3]);
        assert_eq!(groups.reference_arrays, [6]);
        assert_eq!(groups.arrays(TableKind::BlobArray), [3]);
    }

    #[test]
    fn test_requires_exactly_one_instance_id() {
        assert!(MemberGroups::extract([MemberRole::String]).is_err());
        assert!(MemberGroups::extract([MemberRole::InstanceId, MemberRole::InstanceId]).is_err());

        let groups = MemberGroups::extract([MemberRole::InstanceId]).unwrap();
        assert!(groups.columns().is_empty());
    }
}
