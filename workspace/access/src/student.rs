//! Public learner registration.

use chrono::Utc;
use common::StudentDto;
use model::entities::student;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument};

use crate::error::{AccessError, ConflictField, Result};
use crate::validation::{SignupInput, parse_date, take_required, validate_input};

const DUPLICATE_EMAIL: &str = "Email already registered";

pub fn to_dto(model: student::Model) -> StudentDto {
    StudentDto {
        student_id: model.student_id,
        full_name: model.full_name,
        email: model.email,
        address: model.address,
        date_of_birth: model.date_of_birth,
        avatar: model.avatar,
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn duplicate_email() -> AccessError {
    AccessError::Conflict {
        field: ConflictField::Email,
        message: DUPLICATE_EMAIL.to_string(),
    }
}

pub struct StudentRegistry<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StudentRegistry<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: SignupInput) -> Result<StudentDto> {
        validate_input(&input)?;

        let email = take_required(input.email, "email")?;
        let date_of_birth = parse_date(&take_required(input.date_of_birth, "date_of_birth")?)
            .ok_or_else(|| {
                AccessError::Validation(vec![common::ValidationIssue {
                    path: vec!["date_of_birth".to_string()],
                    message: "Date of birth must be a valid date".to_string(),
                    code: "date".to_string(),
                }])
            })?;

        let taken = student::Entity::find()
            .filter(student::Column::Email.eq(email.as_str()))
            .one(self.db)
            .await?
            .is_some();
        if taken {
            debug!("Signup rejected: email already registered");
            return Err(duplicate_email());
        }

        let now = Utc::now();
        let created = student::ActiveModel {
            full_name: Set(take_required(input.full_name, "full_name")?),
            email: Set(email),
            address: Set(take_required(input.address, "address")?),
            date_of_birth: Set(date_of_birth),
            avatar: Set(input.avatar),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| match AccessError::from_write(e, ConflictField::Email) {
            AccessError::Conflict { .. } => duplicate_email(),
            other => other,
        })?;

        info!(student_id = created.student_id, "Student registered");
        Ok(to_dto(created))
    }
}
