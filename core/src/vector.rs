use std::ops::Mul;

macro_rules! define_vector {
    ($name:ident, $($fields:ident),+) => {

        #[derive(
            Debug,
            Default,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Clone,
            Copy,
            Add,
            AddAssign,
            Sub,
            SubAssign,
        )]
        pub struct $name<T> {
            $(pub $fields: T,)+
        }

        impl<T> Mul<T> for $name<T>
        where
            T: Mul<T, Output = T> + Copy,
        {
            type Output = Self;

            fn mul(self, rhs: T) -> Self::Output {
                Self {
                    $($fields: self.$fields * rhs,)+
                }
            }
        }
    };
}

define_vector!(Vector2, x, y);

pub type Vector2ISize = Vector2<isize>;

#[test]
fn test_vector_arithmetic() {
    let a = Vector2ISize { x: 2, y: -3 };
    let b = Vector2ISize { x: -1, y: 5 };
    assert_eq!(a + b, Vector2ISize { x: 1, y: 2 });
    assert_eq!(a - b, Vector2ISize { x: 3, y: -8 });
    assert_eq!(a * 3, Vector2ISize { x: 6, y: -9 });
}

#[test]
fn test_vector_ordering_is_lexicographic() {
    let mut vectors = vec![
        Vector2ISize { x: 1, y: 0 },
        Vector2ISize { x: 0, y: 7 },
        Vector2ISize { x: 0, y: -1 },
    ];
    vectors.sort();
    assert_eq!(
        vectors,
        vec![
            Vector2ISize { x: 0, y: -1 },
            Vector2ISize { x: 0, y: 7 },
            Vector2ISize { x: 1, y: 0 },
        ]
    );
}
