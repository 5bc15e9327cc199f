//! Validation chains for each API operation.
//!
//! Every operation is a marker type implementing [`Operation`]; its chain is
//! built once on first use and shared read-only afterwards.

use regex::Regex;
use std::sync::LazyLock;

use super::checks::is_strong_password;
use super::{Check, Sanitizer, ValidationChain};

/// An API operation with a declared validation chain.
pub trait Operation {
    fn chain() -> &'static ValidationChain;
}

macro_rules! operation {
    ($(#[$meta:meta])* $name:ident => $build:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Operation for $name {
            fn chain() -> &'static ValidationChain {
                static CHAIN: LazyLock<ValidationChain> = LazyLock::new(|| $build);
                &CHAIN
            }
        }
    };
}

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]{1,14}$").expect("phone pattern"));

const PASSWORD_RULE: Check = Check::Predicate("strong_password", is_strong_password);

const NON_NEGATIVE: Check = Check::Float {
    min: Some(0.0),
    max: None,
};

const fn float_between(min: f64, max: f64) -> Check {
    Check::Float {
        min: Some(min),
        max: Some(max),
    }
}

const fn length_between(min: usize, max: usize) -> Check {
    Check::Length {
        min: Some(min),
        max: Some(max),
    }
}

const fn min_length(min: usize) -> Check {
    Check::Length {
        min: Some(min),
        max: None,
    }
}

/// `page` >= 1 and `limit` in 1..=100.
fn paginated(chain: ValidationChain) -> ValidationChain {
    chain
        .optional(
            "page",
            Check::Int {
                min: Some(1),
                max: None,
            },
            "Page must be a positive integer",
        )
        .optional(
            "limit",
            Check::Int {
                min: Some(1),
                max: Some(100),
            },
            "Limit must be between 1 and 100",
        )
}

// =============================================================================
// Workouts
// =============================================================================

operation!(
    /// `POST /workouts`
    CreateWorkout => ValidationChain::new()
        .forbidden("id", "ID should not be provided when creating a workout")
        .required("body_part", Check::NotEmpty, "Body part is required")
        .trim("body_part")
        .required("target_area", Check::NotEmpty, "Target area is required")
        .trim("target_area")
        .required("name", Check::NotEmpty, "Workout name is required")
        .trim("name")
        .required("equipment", Check::NotEmpty, "Equipment is required")
        .trim("equipment")
        .required("level", Check::NotEmpty, "Level is required")
        .trim("level")
        .trim("description")
        .optional_if_falsy("gif_link", Check::Url, "GIF link must be a valid URL")
        .trim("local_image_path")
);

operation!(
    /// `PUT /workouts/{id}`
    UpdateWorkout => ValidationChain::new()
        .optional("body_part", Check::NotEmpty, "Body part cannot be empty")
        .trim("body_part")
        .optional("target_area", Check::NotEmpty, "Target area cannot be empty")
        .trim("target_area")
        .optional("name", Check::NotEmpty, "Workout name cannot be empty")
        .trim("name")
        .optional("equipment", Check::NotEmpty, "Equipment cannot be empty")
        .trim("equipment")
        .optional("level", Check::NotEmpty, "Level cannot be empty")
        .trim("level")
        .trim("description")
        .optional("gif_link", Check::Url, "GIF link must be a valid URL")
        .trim("local_image_path")
);

operation!(
    /// `GET /workouts`
    WorkoutQuery => paginated(ValidationChain::new())
        .trim("body_part")
        .trim("target_area")
        .trim("equipment")
        .trim("level")
        .trim("search")
);

// =============================================================================
// Foods
// =============================================================================

operation!(
    /// `POST /foods`
    CreateFood => ValidationChain::new()
        .forbidden("id", "ID should not be provided when creating a food")
        .required("name", Check::NotEmpty, "Food name is required")
        .trim("name")
        .required("calories", Check::NotEmpty, "Calories is required")
        .required("calories", NON_NEGATIVE, "Calories must be a positive number")
        .optional("protein", NON_NEGATIVE, "Protein must be a positive number")
        .optional("carbs", NON_NEGATIVE, "Carbs must be a positive number")
        .optional("fats", NON_NEGATIVE, "Fats must be a positive number")
        .optional("fiber", NON_NEGATIVE, "Fiber must be a positive number")
        .optional("sugar", NON_NEGATIVE, "Sugar must be a positive number")
        .trim("serving_size")
        .trim("category")
        .trim("description")
        .optional_if_falsy("image_url", Check::Url, "Image URL must be a valid URL")
);

operation!(
    /// `PUT /foods/{id}`
    UpdateFood => ValidationChain::new()
        .optional("name", Check::NotEmpty, "Food name cannot be empty")
        .trim("name")
        .optional("calories", NON_NEGATIVE, "Calories must be a positive number")
        .optional("protein", NON_NEGATIVE, "Protein must be a positive number")
        .optional("carbs", NON_NEGATIVE, "Carbs must be a positive number")
        .optional("fats", NON_NEGATIVE, "Fats must be a positive number")
        .optional("fiber", NON_NEGATIVE, "Fiber must be a positive number")
        .optional("sugar", NON_NEGATIVE, "Sugar must be a positive number")
        .trim("serving_size")
        .trim("category")
        .trim("description")
        .optional_if_falsy("image_url", Check::Url, "Image URL must be a valid URL")
);

operation!(
    /// `GET /foods`
    FoodQuery => paginated(ValidationChain::new())
        .trim("search")
        .optional("minCalories", NON_NEGATIVE, "Minimum calories must be a positive number")
        .optional("maxCalories", NON_NEGATIVE, "Maximum calories must be a positive number")
        .optional("minProtein", NON_NEGATIVE, "Minimum protein must be a positive number")
        .trim("category")
);

// =============================================================================
// Users
// =============================================================================

operation!(
    UserRegistration => ValidationChain::new()
        .required("email", Check::Email, "Please provide a valid email address")
        .sanitize("email", Sanitizer::NormalizeEmail)
        .required("username", length_between(3, 30), "Username must be between 3 and 30 characters")
        .required(
            "username",
            Check::Matches(USERNAME.clone()),
            "Username can only contain letters, numbers, and underscores",
        )
        .required("password", min_length(8), "Password must be at least 8 characters long")
        .required(
            "password",
            PASSWORD_RULE,
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
        )
        .trim("firstName")
        .optional("firstName", length_between(1, 50), "First name must be between 1 and 50 characters")
        .trim("lastName")
        .optional("lastName", length_between(1, 50), "Last name must be between 1 and 50 characters")
);

operation!(
    UserLogin => ValidationChain::new()
        .required("emailOrUsername", Check::NotEmpty, "Email or username is required")
        .trim("emailOrUsername")
        .required("password", Check::NotEmpty, "Password is required")
);

operation!(
    ProfileUpdate => ValidationChain::new()
        .optional("email", Check::Email, "Please provide a valid email address")
        .sanitize("email", Sanitizer::NormalizeEmail)
        .optional("username", length_between(3, 30), "Username must be between 3 and 30 characters")
        .optional(
            "username",
            Check::Matches(USERNAME.clone()),
            "Username can only contain letters, numbers, and underscores",
        )
        .trim("firstName")
        .optional("firstName", length_between(1, 50), "First name must be between 1 and 50 characters")
        .trim("lastName")
        .optional("lastName", length_between(1, 50), "Last name must be between 1 and 50 characters")
        .trim("bio")
        .optional(
            "bio",
            Check::Length { min: None, max: Some(500) },
            "Bio must not exceed 500 characters",
        )
        .optional("dateOfBirth", Check::Iso8601, "Please provide a valid date")
        .optional("phone", Check::Matches(PHONE.clone()), "Please provide a valid phone number")
        .optional(
            "gender",
            Check::OneOf(&["male", "female", "other"]),
            "Gender must be male, female, or other",
        )
);

operation!(
    BodyInformation => ValidationChain::new()
        .optional("height", float_between(0.0, 300.0), "Height must be between 0 and 300 cm")
        .optional("weight", float_between(0.0, 500.0), "Weight must be between 0 and 500 kg")
        .optional(
            "fitnessGoal",
            Check::OneOf(&["weight_loss", "muscle_gain", "maintenance"]),
            "Invalid fitness goal",
        )
        .optional(
            "activityLevel",
            Check::OneOf(&["sedentary", "lightly_active", "moderately_active", "very_active"]),
            "Invalid activity level",
        )
        .optional(
            "bodyFatPercentage",
            float_between(0.0, 100.0),
            "Body fat percentage must be between 0 and 100",
        )
        .optional("bmi", float_between(0.0, 100.0), "BMI must be between 0 and 100")
);

operation!(
    PasswordChange => ValidationChain::new()
        .required("currentPassword", Check::NotEmpty, "Current password is required")
        .required("newPassword", min_length(8), "New password must be at least 8 characters long")
        .required(
            "newPassword",
            PASSWORD_RULE,
            "New password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
        )
);

operation!(
    PasswordResetRequest => ValidationChain::new()
        .required("email", Check::Email, "Please provide a valid email address")
        .sanitize("email", Sanitizer::NormalizeEmail)
);

operation!(
    ResendVerification => ValidationChain::new()
        .required("email", Check::Email, "Please provide a valid email address")
        .sanitize("email", Sanitizer::NormalizeEmail)
);

operation!(
    PasswordReset => ValidationChain::new()
        .required("token", Check::NotEmpty, "Reset token is required")
        .required("newPassword", min_length(8), "Password must be at least 8 characters long")
        .required(
            "newPassword",
            PASSWORD_RULE,
            "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
        )
);

operation!(
    /// `{id}` path parameter.
    IdParam => ValidationChain::new().required(
        "id",
        Check::Int { min: Some(1), max: None },
        "Valid user ID is required",
    )
);

operation!(
    /// `{token}` path parameter.
    TokenParam => ValidationChain::new().required("token", min_length(1), "Token is required")
);

operation!(
    Pagination => paginated(ValidationChain::new())
);
